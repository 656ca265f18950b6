use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de};
use std::fmt;

/// A single cell value as it crosses the tool boundary. Formula text is a
/// `Text` variant beginning with `=`; blank cells are `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_formula_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim_start().starts_with('='))
    }

    /// Numeric view used by validation bounds and exact search matching.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Stable textual rendering: whole numbers print without a trailing `.0`
    /// so values survive a write/read round trip.
    pub fn display_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => {
                if *b {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Ordered mapping from column name to value, as supplied by the caller and
/// as returned by the read paths.
pub type RowData = IndexMap<String, CellValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ValueType {
    #[default]
    String,
    Number,
    Email,
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "email" => Ok(Self::Email),
            other => Err(de::Error::unknown_variant(
                other,
                &["string", "number", "email"],
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum MatchType {
    #[default]
    Exact,
    Contains,
}

impl<'de> Deserialize<'de> for MatchType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "contains" => Ok(Self::Contains),
            other => Err(de::Error::unknown_variant(other, &["exact", "contains"])),
        }
    }
}

/// Per-column validation constraints. A rule only fires for columns that are
/// present in the incoming row mapping.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ColumnRule {
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
}

pub type ValidationRules = IndexMap<String, ColumnRule>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub passed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct FormulaReport {
    pub formulas_processed: usize,
    pub references_adjusted: usize,
}

#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct ReconcileReport {
    pub empty_rows_detected: Vec<u32>,
    pub empty_rows_removed: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReadRowsResponse {
    pub sheet_name: String,
    pub available_sheets: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<RowData>,
    pub row_count: usize,
    pub column_count: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SheetStats {
    pub name: String,
    pub data_rows: u32,
    pub columns: u32,
    pub headers: Vec<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SummaryResponse {
    pub sheet_count: usize,
    pub sheet_names: Vec<String>,
    pub sheets: Vec<SheetStats>,
    pub total_data_rows: u64,
    pub preview_sheet: String,
    pub preview_rows: Vec<RowData>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchHit {
    pub row_number: u32,
    pub value: CellValue,
    pub row_data: RowData,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchResponse {
    pub sheet_name: String,
    pub column_name: String,
    pub match_type: MatchType,
    pub matches: Vec<SearchHit>,
    pub match_count: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct InsertRowsResponse {
    pub sheet_name: String,
    pub inserted_rows: usize,
    pub insert_position: String,
    pub actual_insert_row: u32,
    pub validation_report: ValidationReport,
    pub formula_report: FormulaReport,
    #[serde(flatten)]
    pub reconcile_report: ReconcileReport,
    pub data_rows_after: u32,
    pub saved_to: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeleteRowResponse {
    pub sheet_name: String,
    pub deleted_row: u32,
    pub deleted_data: RowData,
    pub remaining_rows: u32,
    pub data_rows: u32,
    pub saved_to: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SetCellTextResponse {
    pub sheet_name: String,
    pub cell: String,
    pub row_number: u32,
    pub column_number: u32,
    pub text_content: String,
    pub previous_value: CellValue,
    pub formatting_preserved: bool,
    pub saved_to: String,
}
