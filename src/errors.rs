use crate::model::ValidationReport;
use serde_json::Value;
use thiserror::Error;

/// Operation failures surfaced to the caller as `{success: false, error, data}`.
/// These never become MCP protocol errors; see `server::to_mcp_error_for_tool`
/// for the protocol-level cases (bad params, disabled tools, oversized output).
#[derive(Debug, Error)]
pub enum OpError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("unsupported file format '.{extension}' (supported: .xlsx, .xls)")]
    UnsupportedFormat { extension: String },

    #[error("sheet '{name}' not found; available sheets: {}", available.join(", "))]
    SheetNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid insert position '{position}' (expected 'end', 'beginning', or 'after_row_<N>')")]
    InvalidPosition { position: String },

    #[error("invalid row number {row}: {reason}")]
    InvalidRow { row: u32, reason: String },

    #[error("invalid cell target: {reason}")]
    InvalidCell { reason: String },

    #[error("column '{name}' not found; available columns: {}", available.join(", "))]
    ColumnNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("batch of {given} rows exceeds the limit of {limit}")]
    BatchTooLarge { given: usize, limit: usize },

    #[error("no rows provided to insert")]
    BatchEmpty,

    #[error("sheet '{name}' is empty; cannot determine column structure")]
    EmptySheet { name: String },

    #[error("sheet has no data rows (only the header row)")]
    NoDataRows,

    #[error("no valid rows to insert: all {} rows failed validation", report.failed)]
    NoValidRows { report: ValidationReport },

    #[error("formulas are not allowed here; this tool writes plain text only")]
    FormulaNotAllowed,

    #[error("workbook operation failed: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl OpError {
    /// Diagnostic payload returned as the envelope's `data` field on failure.
    pub fn diagnostic(&self) -> Option<Value> {
        match self {
            Self::NoValidRows { report } => Some(serde_json::json!({ "validation_report": report })),
            _ => None,
        }
    }
}
