use crate::errors::OpError;
use crate::model::{
    CellValue, MatchType, ReadRowsResponse, RowData, SearchHit, SearchResponse, SheetStats,
    SummaryResponse,
};
use crate::workbook;
use anyhow::anyhow;
use schemars::JsonSchema;
use serde::Deserialize;

const DEFAULT_READ_MAX_ROWS: usize = 1_000;
const DEFAULT_PREVIEW_ROWS: usize = 10;
const MAX_PREVIEW_ROWS: usize = 20;
const DEFAULT_SEARCH_RESULTS: usize = 50;
const MAX_SEARCH_RESULTS: usize = 100;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadExcelFileParams {
    /// Path to the .xlsx/.xls file.
    pub file_path: String,
    /// Sheet to read; defaults to the first sheet.
    #[serde(default)]
    pub sheet_name: Option<String>,
    /// Maximum number of data rows to return.
    #[serde(default = "default_read_max_rows")]
    pub max_rows: usize,
}

fn default_read_max_rows() -> usize {
    DEFAULT_READ_MAX_ROWS
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetExcelSummaryParams {
    /// Path to the .xlsx/.xls file.
    pub file_path: String,
    /// Sheet to preview; an unknown name falls back to the first sheet.
    #[serde(default)]
    pub target_sheet: Option<String>,
    /// Preview row count (capped at 20).
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchExcelDataParams {
    /// Path to the .xlsx/.xls file.
    pub file_path: String,
    /// Header name of the column to scan.
    pub column_name: String,
    /// Value to match against.
    pub search_value: CellValue,
    /// Sheet to search; defaults to the first sheet.
    #[serde(default)]
    pub sheet_name: Option<String>,
    /// 'exact' or 'contains' (contains is case-insensitive and takes a text
    /// search value).
    #[serde(default)]
    pub match_type: MatchType,
    /// Maximum matches to return (capped at 100).
    #[serde(default = "default_search_results")]
    pub max_results: usize,
}

fn default_search_results() -> usize {
    DEFAULT_SEARCH_RESULTS
}

pub async fn read_excel_file(params: ReadExcelFileParams) -> Result<ReadRowsResponse, OpError> {
    run_blocking("read_excel_file", move || read_excel_file_blocking(params)).await
}

pub async fn get_excel_summary(params: GetExcelSummaryParams) -> Result<SummaryResponse, OpError> {
    run_blocking("get_excel_summary", move || {
        get_excel_summary_blocking(params)
    })
    .await
}

pub async fn search_excel_data(params: SearchExcelDataParams) -> Result<SearchResponse, OpError> {
    run_blocking("search_excel_data", move || {
        search_excel_data_blocking(params)
    })
    .await
}

pub(crate) async fn run_blocking<T, F>(tool: &'static str, work: F) -> Result<T, OpError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, OpError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| OpError::Unknown(anyhow!("{tool} task failed: {e}")))?
}

fn read_excel_file_blocking(params: ReadExcelFileParams) -> Result<ReadRowsResponse, OpError> {
    let wb = workbook::open(&params.file_path, params.sheet_name.as_deref())?;
    let sheet = wb.sheet();
    let headers = workbook::header_columns(sheet);

    let data_rows = sheet.get_highest_row().saturating_sub(1) as usize;
    let take = data_rows.min(params.max_rows.max(1));
    let rows: Vec<RowData> = (0..take)
        .map(|offset| workbook::read_row(sheet, &headers, offset as u32 + 2))
        .collect();

    Ok(ReadRowsResponse {
        sheet_name: wb.sheet_name.clone(),
        available_sheets: wb.sheet_names(),
        column_count: headers.len(),
        columns: headers,
        row_count: rows.len(),
        truncated: data_rows > take,
        rows,
    })
}

fn get_excel_summary_blocking(params: GetExcelSummaryParams) -> Result<SummaryResponse, OpError> {
    let wb = workbook::open(&params.file_path, None)?;
    let sheet_names = wb.sheet_names();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    let mut total_data_rows = 0u64;
    for sheet in wb.book.get_sheet_collection() {
        let data_rows = sheet.get_highest_row().saturating_sub(1);
        total_data_rows += data_rows as u64;
        sheets.push(SheetStats {
            name: sheet.get_name().to_string(),
            data_rows,
            columns: sheet.get_highest_column(),
            headers: workbook::header_columns(sheet),
        });
    }

    let preview_sheet = match params.target_sheet.as_deref() {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.to_string(),
        Some(name) => {
            tracing::warn!(
                target_sheet = name,
                "target sheet not found, previewing the first sheet"
            );
            wb.sheet_name.clone()
        }
        None => wb.sheet_name.clone(),
    };

    let sheet = wb
        .book
        .get_sheet_by_name(&preview_sheet)
        .expect("preview sheet resolved");
    let headers = workbook::header_columns(sheet);
    let data_rows = sheet.get_highest_row().saturating_sub(1) as usize;
    let take = data_rows.min(params.preview_rows.min(MAX_PREVIEW_ROWS));
    let preview_rows: Vec<RowData> = (0..take)
        .map(|offset| workbook::read_row(sheet, &headers, offset as u32 + 2))
        .collect();

    Ok(SummaryResponse {
        sheet_count: sheet_names.len(),
        sheet_names,
        sheets,
        total_data_rows,
        preview_sheet,
        preview_rows,
    })
}

fn search_excel_data_blocking(params: SearchExcelDataParams) -> Result<SearchResponse, OpError> {
    let wb = workbook::open(&params.file_path, params.sheet_name.as_deref())?;
    let sheet = wb.sheet();
    let headers = workbook::header_columns(sheet);

    let Some(column_index) = headers.iter().position(|h| h == &params.column_name) else {
        return Err(OpError::ColumnNotFound {
            name: params.column_name,
            available: headers,
        });
    };
    let col = column_index as u32 + 1;

    // 'contains' only makes sense for text; anything else silently degrades
    // to an exact match (long-standing behavior callers depend on).
    let match_type = match (params.match_type, &params.search_value) {
        (MatchType::Contains, CellValue::Text(_)) => MatchType::Contains,
        (MatchType::Contains, _) => {
            tracing::warn!("contains match requested for a non-string value, using exact match");
            MatchType::Exact
        }
        (exact, _) => exact,
    };

    // Contains is case-insensitive and scans the string form of every cell,
    // numbers included.
    let needle = params.search_value.display_string().to_lowercase();

    let limit = params.max_results.clamp(1, MAX_SEARCH_RESULTS);
    let mut matches = Vec::new();
    let mut match_count = 0usize;
    for row in 2..=sheet.get_highest_row() {
        let value = workbook::read_cell(sheet, col, row);
        let hit = match match_type {
            MatchType::Exact => values_match(&value, &params.search_value),
            MatchType::Contains => value.display_string().to_lowercase().contains(&needle),
        };
        if !hit {
            continue;
        }
        match_count += 1;
        if matches.len() < limit {
            matches.push(SearchHit {
                row_number: row,
                value,
                row_data: workbook::read_row(sheet, &headers, row),
            });
        }
    }

    Ok(SearchResponse {
        sheet_name: wb.sheet_name.clone(),
        column_name: params.column_name,
        match_type,
        truncated: match_count > matches.len(),
        match_count,
        matches,
    })
}

fn values_match(cell: &CellValue, search: &CellValue) -> bool {
    if let (Some(a), Some(b)) = (cell.as_number(), search.as_number()) {
        return a == b;
    }
    cell.display_string() == search.display_string()
}
