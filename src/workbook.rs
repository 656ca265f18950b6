use crate::errors::OpError;
use crate::model::{CellValue, RowData};
use anyhow::{Context, anyhow};
use std::io;
use std::path::{Path, PathBuf};
use umya_spreadsheet::helper::coordinate::coordinate_from_index;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Fixed allow-list, checked before any file access.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Hard addressing limits of the workbook format.
pub const MAX_SHEET_ROWS: u32 = 1_048_576;
pub const MAX_SHEET_COLUMNS: u32 = 16_384;

/// A workbook opened for one operation, with the target sheet resolved.
#[derive(Debug)]
pub struct OpenWorkbook {
    pub book: Spreadsheet,
    pub sheet_name: String,
    pub path: PathBuf,
}

impl OpenWorkbook {
    pub fn sheet(&self) -> &Worksheet {
        // Resolution happened in `open`, so the sheet is present.
        self.book
            .get_sheet_by_name(&self.sheet_name)
            .expect("resolved sheet present")
    }

    pub fn sheet_mut(&mut self) -> &mut Worksheet {
        self.book
            .get_sheet_by_name_mut(&self.sheet_name)
            .expect("resolved sheet present")
    }

    pub fn sheet_names(&self) -> Vec<String> {
        sheet_names(&self.book)
    }

    /// Persist to `save_as` when given, else overwrite the source path.
    /// Returns the path written.
    pub fn save(&self, save_as: Option<&str>) -> Result<PathBuf, OpError> {
        let target = match save_as {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => self.path.clone(),
        };
        umya_spreadsheet::writer::xlsx::write(&self.book, &target)
            .with_context(|| format!("failed to save workbook '{}'", target.display()))?;
        Ok(target)
    }
}

pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect()
}

/// Validate the path and extension, open the workbook, and resolve the target
/// sheet (named, or the first sheet when no name is given).
pub fn open(path: &str, sheet_name: Option<&str>) -> Result<OpenWorkbook, OpError> {
    let path_buf = PathBuf::from(path);
    check_path(&path_buf)?;

    let book = umya_spreadsheet::reader::xlsx::read(&path_buf)
        .map_err(|e| anyhow!("failed to open workbook '{}': {}", path_buf.display(), e))?;

    let available = sheet_names(&book);
    let resolved = match sheet_name {
        Some(name) => {
            if available.iter().any(|s| s == name) {
                name.to_string()
            } else {
                return Err(OpError::SheetNotFound {
                    name: name.to_string(),
                    available,
                });
            }
        }
        None => available
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook '{}' contains no sheets", path_buf.display()))?,
    };

    Ok(OpenWorkbook {
        book,
        sheet_name: resolved,
        path: path_buf,
    })
}

fn check_path(path: &Path) -> Result<(), OpError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(OpError::UnsupportedFormat { extension });
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(OpError::NotFound {
            path: path.display().to_string(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(OpError::NotFound {
            path: path.display().to_string(),
        }),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(OpError::PermissionDenied {
            path: path.display().to_string(),
        }),
        Err(e) => Err(OpError::Unknown(anyhow!(
            "failed to stat '{}': {}",
            path.display(),
            e
        ))),
    }
}

/// Column names from row 1; blank or missing header cells are synthesized as
/// `Column_<index>` (1-based).
pub fn header_columns(sheet: &Worksheet) -> Vec<String> {
    let max_column = sheet.get_highest_column();
    (1..=max_column)
        .map(|col| {
            let raw = sheet
                .get_cell((col, 1))
                .map(|cell| cell.get_value().to_string())
                .unwrap_or_default();
            if raw.trim().is_empty() {
                format!("Column_{}", col)
            } else {
                raw
            }
        })
        .collect()
}

/// Read one cell back into the tagged value model. Formulas surface as text
/// with a leading `=`; everything else is re-typed by parsing the stored
/// string (matching how `write_cell` stores values).
pub fn read_cell(sheet: &Worksheet, col: u32, row: u32) -> CellValue {
    let Some(cell) = sheet.get_cell((col, row)) else {
        return CellValue::Null;
    };
    if cell.is_formula() {
        return CellValue::Text(format!("={}", cell.get_formula()));
    }
    let raw = cell.get_value();
    if raw.trim().is_empty() {
        return CellValue::Null;
    }
    match raw.as_ref() {
        "TRUE" => CellValue::Bool(true),
        "FALSE" => CellValue::Bool(false),
        _ => match raw.parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(raw.to_string()),
        },
    }
}

/// Write one tagged value into a cell. Formula text is stored as a formula
/// (leading `=` stripped); nulls clear the stored value.
pub fn write_cell(sheet: &mut Worksheet, col: u32, row: u32, value: &CellValue) {
    let cell = sheet.get_cell_mut((col, row));
    match value {
        CellValue::Null => {
            cell.set_value_string(String::new());
        }
        CellValue::Bool(b) => {
            cell.set_value_bool(*b);
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Text(s) => {
            let trimmed = s.trim_start();
            if let Some(stripped) = trimmed.strip_prefix('=') {
                cell.set_formula(stripped.to_string());
                cell.get_cell_value_mut()
                    .set_formula_result_default(String::new());
            } else {
                cell.set_value_string(s.clone());
            }
        }
    }
}

/// Read one data row as a header-keyed mapping.
pub fn read_row(sheet: &Worksheet, headers: &[String], row: u32) -> RowData {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (header.clone(), read_cell(sheet, idx as u32 + 1, row)))
        .collect()
}

/// `A1`-style label for a (column, row) pair.
pub fn cell_label(col: u32, row: u32) -> String {
    coordinate_from_index(&col, &row)
}
