pub mod format;
pub mod formula;
pub mod position;
pub mod reconcile;
pub mod validate;

use crate::errors::OpError;
use crate::model::{
    CellValue, FormulaReport, ReconcileReport, RowData, ValidationReport, ValidationRules,
};
use crate::workbook;
use position::InsertPosition;
use umya_spreadsheet::{Style, Worksheet};

/// Hard cap on rows per insert call; `batch_size` may lower it but never
/// raise it.
pub const MAX_BATCH_ROWS: usize = 500;

/// Longest text a single cell can hold in the workbook format.
pub const MAX_CELL_TEXT_LEN: usize = 32_767;

pub struct InsertOutcome {
    pub inserted: usize,
    pub insert_row: u32,
    pub validation_report: ValidationReport,
    pub formula_report: FormulaReport,
    pub reconcile_report: ReconcileReport,
    pub data_rows_after: u32,
}

pub struct DeleteOutcome {
    pub deleted_data: RowData,
    pub remaining_rows: u32,
    pub data_rows: u32,
}

pub struct SetCellOutcome {
    pub cell: String,
    pub previous_value: CellValue,
}

/// Batch bounds are checked before any file access.
pub fn check_batch(rows: usize, batch_size: usize) -> Result<(), OpError> {
    if rows == 0 {
        return Err(OpError::BatchEmpty);
    }
    if batch_size == 0 || batch_size > MAX_BATCH_ROWS {
        return Err(OpError::BatchTooLarge {
            given: batch_size,
            limit: MAX_BATCH_ROWS,
        });
    }
    if rows > batch_size {
        return Err(OpError::BatchTooLarge {
            given: rows,
            limit: batch_size,
        });
    }
    Ok(())
}

/// Insert a validated batch of rows at the resolved position, propagate
/// formatting, rewrite trailing formula references, and reconcile blanks.
/// The caller saves the workbook afterwards; nothing here touches disk.
pub fn insert_rows(
    sheet: &mut Worksheet,
    sheet_name: &str,
    rows: &[RowData],
    position: InsertPosition,
    rules: Option<&ValidationRules>,
    preserve_formatting: bool,
    calculate_formulas: bool,
) -> Result<InsertOutcome, OpError> {
    let max_row = sheet.get_highest_row();
    if max_row == 0 {
        return Err(OpError::EmptySheet {
            name: sheet_name.to_string(),
        });
    }
    let headers = workbook::header_columns(sheet);

    let (committed, validation_report) = match rules {
        Some(rules) if !rules.is_empty() => {
            let (committed, report) = validate::validate_rows(rows, rules);
            if committed.is_empty() {
                return Err(OpError::NoValidRows { report });
            }
            (committed, report)
        }
        _ => (
            rows.to_vec(),
            ValidationReport {
                passed: rows.len(),
                ..ValidationReport::default()
            },
        ),
    };

    let insert_row = position.resolve(max_row);
    let count = committed.len() as u32;
    if position.needs_gap(max_row) {
        sheet.insert_new_row(&insert_row, &count);
    }

    let reference_styles = if preserve_formatting {
        snapshot_reference_row(sheet, &headers, insert_row, max_row)
    } else {
        None
    };

    let mut formula_report = FormulaReport::default();
    for (offset, row) in committed.iter().enumerate() {
        let target_row = insert_row + offset as u32;
        for (idx, header) in headers.iter().enumerate() {
            let col = idx as u32 + 1;
            let value = row.get(header).cloned().unwrap_or(CellValue::Null);

            if calculate_formulas
                && value.is_formula_text()
                && let CellValue::Text(text) = &value
            {
                formula_report.formulas_processed += 1;
                let outcome = formula::shift_row_references(text, target_row, max_row);
                if outcome.adjusted {
                    formula_report.references_adjusted += 1;
                }
                workbook::write_cell(sheet, col, target_row, &CellValue::Text(outcome.text));
            } else {
                workbook::write_cell(sheet, col, target_row, &value);
            }

            let reference = reference_styles
                .as_ref()
                .and_then(|styles| styles.get(idx))
                .and_then(|style| style.as_ref());
            format::apply_cell_policy(sheet, col, target_row, reference, preserve_formatting);
        }
    }

    let reconcile_report = reconcile::remove_blank_rows(sheet);
    let data_rows_after = sheet.get_highest_row().saturating_sub(1);

    Ok(InsertOutcome {
        inserted: committed.len(),
        insert_row,
        validation_report,
        formula_report,
        reconcile_report,
        data_rows_after,
    })
}

/// Styles of the row just above the insertion point, clamped to the data
/// region `[2, max_row]`. A header-only sheet has no reference row.
fn snapshot_reference_row(
    sheet: &Worksheet,
    headers: &[String],
    insert_row: u32,
    max_row: u32,
) -> Option<Vec<Option<Style>>> {
    if max_row < 2 {
        return None;
    }
    let reference_row = insert_row.saturating_sub(1).clamp(2, max_row);
    Some(
        (1..=headers.len() as u32)
            .map(|col| format::style_snapshot(sheet, col, reference_row))
            .collect(),
    )
}

/// Delete a single data row. Row 1 is the header and is never deletable.
pub fn delete_row(sheet: &mut Worksheet, row_number: u32) -> Result<DeleteOutcome, OpError> {
    let max_row = sheet.get_highest_row();
    if max_row <= 1 {
        return Err(OpError::NoDataRows);
    }
    if row_number < 2 {
        return Err(OpError::InvalidRow {
            row: row_number,
            reason: "row 1 is the header row and cannot be deleted".to_string(),
        });
    }
    if row_number > max_row {
        return Err(OpError::InvalidRow {
            row: row_number,
            reason: format!("sheet only extends to row {max_row}"),
        });
    }

    let headers = workbook::header_columns(sheet);
    let deleted_data = workbook::read_row(sheet, &headers, row_number);
    sheet.remove_row(&row_number, &1);

    let remaining_rows = max_row - 1;
    Ok(DeleteOutcome {
        deleted_data,
        remaining_rows,
        data_rows: remaining_rows.saturating_sub(1),
    })
}

/// Write plain text into one cell. Formula injection is rejected; alignment
/// policy is applied unconditionally; other style axes survive the write
/// when `preserve_formatting` is set.
pub fn set_cell_text(
    sheet: &mut Worksheet,
    row_number: u32,
    column_number: u32,
    text: &str,
    preserve_formatting: bool,
) -> Result<SetCellOutcome, OpError> {
    if row_number == 0 || row_number > workbook::MAX_SHEET_ROWS {
        return Err(OpError::InvalidCell {
            reason: format!(
                "row {} out of range 1..={}",
                row_number,
                workbook::MAX_SHEET_ROWS
            ),
        });
    }
    if column_number == 0 || column_number > workbook::MAX_SHEET_COLUMNS {
        return Err(OpError::InvalidCell {
            reason: format!(
                "column {} out of range 1..={}",
                column_number,
                workbook::MAX_SHEET_COLUMNS
            ),
        });
    }
    if text.chars().count() > MAX_CELL_TEXT_LEN {
        return Err(OpError::InvalidCell {
            reason: format!("text exceeds {MAX_CELL_TEXT_LEN} characters"),
        });
    }
    if text.trim_start().starts_with('=') {
        return Err(OpError::FormulaNotAllowed);
    }

    let previous_value = workbook::read_cell(sheet, column_number, row_number);
    let prior_style = format::style_snapshot(sheet, column_number, row_number);

    sheet
        .get_cell_mut((column_number, row_number))
        .set_value_string(text.to_string());

    match prior_style {
        Some(prior) => {
            format::restore_cell_style(sheet, column_number, row_number, &prior, preserve_formatting)
        }
        None => format::apply_cell_policy(sheet, column_number, row_number, None, false),
    }

    Ok(SetCellOutcome {
        cell: workbook::cell_label(column_number, row_number),
        previous_value,
    })
}
