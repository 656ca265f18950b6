use crate::engine;
use crate::engine::position::InsertPosition;
use crate::errors::OpError;
use crate::model::{
    DeleteRowResponse, InsertRowsResponse, RowData, SetCellTextResponse, ValidationRules,
};
use crate::tools::query::run_blocking;
use crate::workbook;
use schemars::JsonSchema;
use serde::Deserialize;

const DEFAULT_BATCH_SIZE: usize = 100;

/// One row mapping or a list of them; single objects are treated as a batch
/// of one.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RowsInput {
    Many(Vec<RowData>),
    One(RowData),
}

impl RowsInput {
    pub fn into_vec(self) -> Vec<RowData> {
        match self {
            Self::Many(rows) => rows,
            Self::One(row) => vec![row],
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsertExcelRowsParams {
    /// Path to the .xlsx/.xls file.
    pub file_path: String,
    /// One row object or a list of row objects, keyed by header name.
    pub row_data: RowsInput,
    /// Sheet to modify; defaults to the first sheet.
    #[serde(default)]
    pub sheet_name: Option<String>,
    /// 'end', 'beginning', or 'after_row_<N>'.
    #[serde(default = "default_insert_position")]
    pub insert_position: String,
    /// Optional per-column validation rules.
    #[serde(default)]
    pub validation_rules: Option<ValidationRules>,
    /// Copy font/fill/borders from the row above the insertion point.
    #[serde(default = "default_true")]
    pub preserve_formatting: bool,
    /// Rewrite row references in '='-prefixed values.
    #[serde(default = "default_true")]
    pub calculate_formulas: bool,
    /// Per-call row cap (1..=500).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Write the result here instead of overwriting file_path.
    #[serde(default)]
    pub save_as: Option<String>,
}

fn default_insert_position() -> String {
    "end".to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteExcelRowParams {
    /// Path to the .xlsx/.xls file.
    pub file_path: String,
    /// 1-indexed sheet row to delete; row 1 (the header) is protected.
    pub row_number: u32,
    /// Sheet to modify; defaults to the first sheet.
    #[serde(default)]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetCellTextParams {
    /// Path to the .xlsx/.xls file.
    pub file_path: String,
    /// 1-indexed row of the target cell.
    pub row_number: u32,
    /// 1-indexed column of the target cell.
    pub column_number: u32,
    /// Plain text to write; a leading '=' is rejected.
    pub text_content: String,
    /// Sheet to modify; defaults to the first sheet.
    #[serde(default)]
    pub sheet_name: Option<String>,
    /// Keep the cell's font/fill/borders/number format across the write.
    #[serde(default = "default_true")]
    pub preserve_formatting: bool,
}

pub async fn insert_excel_rows(params: InsertExcelRowsParams) -> Result<InsertRowsResponse, OpError> {
    run_blocking("insert_excel_rows", move || {
        insert_excel_rows_blocking(params)
    })
    .await
}

pub async fn delete_excel_row(params: DeleteExcelRowParams) -> Result<DeleteRowResponse, OpError> {
    run_blocking("delete_excel_row", move || delete_excel_row_blocking(params)).await
}

pub async fn set_cell_text(params: SetCellTextParams) -> Result<SetCellTextResponse, OpError> {
    run_blocking("set_cell_text", move || set_cell_text_blocking(params)).await
}

fn insert_excel_rows_blocking(params: InsertExcelRowsParams) -> Result<InsertRowsResponse, OpError> {
    let rows = params.row_data.into_vec();
    engine::check_batch(rows.len(), params.batch_size)?;
    let position = InsertPosition::parse(&params.insert_position)?;

    let mut wb = workbook::open(&params.file_path, params.sheet_name.as_deref())?;
    let sheet_name = wb.sheet_name.clone();
    let outcome = engine::insert_rows(
        wb.sheet_mut(),
        &sheet_name,
        &rows,
        position,
        params.validation_rules.as_ref(),
        params.preserve_formatting,
        params.calculate_formulas,
    )?;
    let saved_to = wb.save(params.save_as.as_deref())?;

    tracing::info!(
        sheet = %sheet_name,
        inserted = outcome.inserted,
        insert_row = outcome.insert_row,
        removed_blank = outcome.reconcile_report.empty_rows_removed,
        "inserted rows"
    );

    Ok(InsertRowsResponse {
        sheet_name,
        inserted_rows: outcome.inserted,
        insert_position: params.insert_position,
        actual_insert_row: outcome.insert_row,
        validation_report: outcome.validation_report,
        formula_report: outcome.formula_report,
        reconcile_report: outcome.reconcile_report,
        data_rows_after: outcome.data_rows_after,
        saved_to: saved_to.display().to_string(),
    })
}

fn delete_excel_row_blocking(params: DeleteExcelRowParams) -> Result<DeleteRowResponse, OpError> {
    let mut wb = workbook::open(&params.file_path, params.sheet_name.as_deref())?;
    let sheet_name = wb.sheet_name.clone();
    let outcome = engine::delete_row(wb.sheet_mut(), params.row_number)?;
    let saved_to = wb.save(None)?;

    tracing::info!(sheet = %sheet_name, row = params.row_number, "deleted row");

    Ok(DeleteRowResponse {
        sheet_name,
        deleted_row: params.row_number,
        deleted_data: outcome.deleted_data,
        remaining_rows: outcome.remaining_rows,
        data_rows: outcome.data_rows,
        saved_to: saved_to.display().to_string(),
    })
}

fn set_cell_text_blocking(params: SetCellTextParams) -> Result<SetCellTextResponse, OpError> {
    let mut wb = workbook::open(&params.file_path, params.sheet_name.as_deref())?;
    let sheet_name = wb.sheet_name.clone();
    let outcome = engine::set_cell_text(
        wb.sheet_mut(),
        params.row_number,
        params.column_number,
        &params.text_content,
        params.preserve_formatting,
    )?;
    let saved_to = wb.save(None)?;

    Ok(SetCellTextResponse {
        sheet_name,
        cell: outcome.cell,
        row_number: params.row_number,
        column_number: params.column_number,
        text_content: params.text_content,
        previous_value: outcome.previous_value,
        formatting_preserved: params.preserve_formatting,
        saved_to: saved_to.display().to_string(),
    })
}
