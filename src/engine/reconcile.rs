use crate::model::ReconcileReport;
use umya_spreadsheet::Worksheet;

/// Remove fully blank data rows, bottom-up so pending indices stay valid.
/// Row 1 (the header) is never scanned. Detection and removal happen in one
/// pass, so the reported counts are equal.
pub fn remove_blank_rows(sheet: &mut Worksheet) -> ReconcileReport {
    let max_row = sheet.get_highest_row();
    let max_column = sheet.get_highest_column();
    if max_row < 2 || max_column == 0 {
        return ReconcileReport::default();
    }

    let detected: Vec<u32> = (2..=max_row)
        .filter(|&row| row_is_blank(sheet, row, max_column))
        .collect();

    for &row in detected.iter().rev() {
        sheet.remove_row(&row, &1);
    }

    ReconcileReport {
        empty_rows_removed: detected.len(),
        empty_rows_detected: detected,
    }
}

fn row_is_blank(sheet: &Worksheet, row: u32, max_column: u32) -> bool {
    (1..=max_column).all(|col| match sheet.get_cell((col, row)) {
        Some(cell) => cell.get_value().trim().is_empty() && !cell.is_formula(),
        None => true,
    })
}
