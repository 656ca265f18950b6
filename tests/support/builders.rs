#![allow(dead_code)]
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::{Spreadsheet, Worksheet};

#[derive(Clone, Debug)]
pub enum CellVal {
    Text(String),
    Num(f64),
    Formula(String),
    Empty,
}

impl From<&str> for CellVal {
    fn from(s: &str) -> Self {
        CellVal::Text(s.to_string())
    }
}

impl From<f64> for CellVal {
    fn from(n: f64) -> Self {
        CellVal::Num(n)
    }
}

impl From<i32> for CellVal {
    fn from(n: i32) -> Self {
        CellVal::Num(n as f64)
    }
}

pub fn set_cell(sheet: &mut Worksheet, col: u32, row: u32, val: &CellVal) {
    match val {
        CellVal::Text(s) => {
            sheet.get_cell_mut((col, row)).set_value(s.clone());
        }
        CellVal::Num(n) => {
            sheet.get_cell_mut((col, row)).set_value_number(*n);
        }
        CellVal::Formula(f) => {
            sheet.get_cell_mut((col, row)).set_formula(f.clone());
        }
        CellVal::Empty => {
            sheet.get_cell_mut((col, row)).set_value("");
        }
    }
}

/// Bold header row at row 1, data rows from row 2 down.
pub fn fill_table<H, R, V>(sheet: &mut Worksheet, headers: &[H], rows: &[R])
where
    H: AsRef<str>,
    R: AsRef<[V]>,
    V: Into<CellVal> + Clone,
{
    for (i, header) in headers.iter().enumerate() {
        let col = i as u32 + 1;
        sheet
            .get_cell_mut((col, 1u32))
            .set_value(header.as_ref().to_string());
        sheet.get_style_mut((col, 1u32)).get_font_mut().set_bold(true);
    }

    for (row_idx, row_data) in rows.iter().enumerate() {
        let row = row_idx as u32 + 2;
        for (col_idx, val) in row_data.as_ref().iter().enumerate() {
            let cell_val: CellVal = val.clone().into();
            set_cell(sheet, col_idx as u32 + 1, row, &cell_val);
        }
    }
}

/// Write a single-sheet workbook into `dir` and return its path.
pub fn workbook_file(dir: &TempDir, name: &str, build: impl FnOnce(&mut Worksheet)) -> PathBuf {
    let mut book = umya_spreadsheet::new_file();
    build(book.get_sheet_mut(&0).expect("first sheet"));
    let path = dir.path().join(name);
    umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
    path
}

/// Header + typed data rows, saved to a temp file.
pub fn table_file<H, R, V>(dir: &TempDir, name: &str, headers: &[H], rows: &[R]) -> PathBuf
where
    H: AsRef<str>,
    R: AsRef<[V]>,
    V: Into<CellVal> + Clone,
{
    workbook_file(dir, name, |sheet| fill_table(sheet, headers, rows))
}

pub fn read_back(path: &Path) -> Spreadsheet {
    umya_spreadsheet::reader::xlsx::read(path).expect("reopen workbook")
}
