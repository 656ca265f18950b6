use crate::config::ServerConfig;
use crate::errors::OpError;
use crate::state::AppState;
use crate::tools;
use anyhow::{Result, anyhow};
use rmcp::{
    ErrorData as McpError, Json, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use {once_cell::sync::Lazy, regex::Regex};

const BASE_INSTRUCTIONS: &str = "\
Excel MCP: row-oriented reading and safe mutation of .xlsx/.xls files.

WORKFLOW:
1) get_excel_summary for orientation (sheets, dimensions, headers, preview)
2) read_excel_file for header-keyed records; search_excel_data for column lookups
3) insert_excel_rows / delete_excel_row / set_cell_text to mutate

RESULT SHAPE:
Every tool returns {success, error, data}. Operation failures (missing file,
bad sheet, failed validation, ...) come back as success=false with a message
in error; data carries the diagnostic payload when one exists (e.g. the
validation report for rejected batches).

TOOL NOTES:
- insert_excel_rows: row_data is one object or a list, keyed by header names.
  insert_position is 'end', 'beginning', or 'after_row_<N>'. Optional
  validation_rules per column: {type: string|number|email, required,
  min_value, max_value, min_length, max_length, pattern}. Rows failing
  validation are skipped and reported; formatting is copied from the row
  above unless preserve_formatting=false.
- delete_excel_row: row 1 is the header and cannot be deleted.
- set_cell_text: plain text only; values starting with '=' are rejected.
- Row 1 is always treated as the header row.";

#[derive(Debug, Error)]
#[error("tool '{tool}' is disabled by server configuration")]
pub struct ToolDisabledError {
    tool: String,
}

impl ToolDisabledError {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

#[derive(Debug, Error)]
#[error("response for tool '{tool}' is {size} bytes, exceeding the limit of {limit} bytes")]
pub struct ResponseTooLargeError {
    tool: String,
    size: usize,
    limit: usize,
}

impl ResponseTooLargeError {
    pub fn new(tool: impl Into<String>, size: usize, limit: usize) -> Self {
        Self {
            tool: tool.into(),
            size,
            limit,
        }
    }
}

/// The `{success, error, data}` envelope every tool returns. Operation
/// failures land here; only parameter, enablement, and size problems become
/// MCP protocol errors.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ToolReply {
    pub success: bool,
    pub error: Option<String>,
    pub data: Option<Value>,
}

impl ToolReply {
    fn from_outcome<T: Serialize>(tool: &str, outcome: Result<T, OpError>) -> Result<Self> {
        match outcome {
            Ok(data) => Ok(Self {
                success: true,
                error: None,
                data: Some(
                    serde_json::to_value(data)
                        .map_err(|e| anyhow!("failed to serialize {tool} response: {e}"))?,
                ),
            }),
            Err(error) => {
                tracing::warn!(tool, error = %error, "operation failed");
                Ok(Self {
                    success: false,
                    data: error.diagnostic(),
                    error: Some(error.to_string()),
                })
            }
        }
    }
}

#[derive(Clone)]
pub struct ExcelServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<ExcelServer>,
}

impl ExcelServer {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self::from_state(Arc::new(AppState::new(config)))
    }

    pub fn from_state(state: Arc<AppState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn run_stdio(self) -> Result<()> {
        let service = self
            .serve(stdio())
            .await
            .inspect_err(|error| tracing::error!("serving error: {:?}", error))?;
        service.waiting().await?;
        Ok(())
    }

    fn ensure_tool_enabled(&self, tool: &str) -> Result<()> {
        tracing::info!(tool = tool, "tool invocation requested");
        if self.state.config().is_tool_enabled(tool) {
            Ok(())
        } else {
            Err(ToolDisabledError::new(tool).into())
        }
    }

    async fn run_tool<T, F>(&self, tool: &str, fut: F) -> Result<Json<ToolReply>, McpError>
    where
        F: Future<Output = Result<T, OpError>>,
        T: Serialize,
    {
        self.ensure_tool_enabled(tool)
            .map_err(|e| to_mcp_error_for_tool(tool, e))?;

        let outcome = if let Some(timeout) = self.state.config().tool_timeout() {
            match tokio::time::timeout(timeout, fut).await {
                Ok(outcome) => outcome,
                Err(_) => Err(OpError::Unknown(anyhow!(
                    "tool '{}' timed out after {}ms",
                    tool,
                    timeout.as_millis()
                ))),
            }
        } else {
            fut.await
        };

        let reply =
            ToolReply::from_outcome(tool, outcome).map_err(|e| to_mcp_error_for_tool(tool, e))?;
        self.ensure_response_size(tool, &reply)
            .map_err(|e| to_mcp_error_for_tool(tool, e))?;
        Ok(Json(reply))
    }

    fn ensure_response_size(&self, tool: &str, reply: &ToolReply) -> Result<()> {
        let Some(limit) = self.state.config().max_response_bytes() else {
            return Ok(());
        };
        let payload = serde_json::to_vec(reply)
            .map_err(|e| anyhow!("failed to serialize response for {}: {}", tool, e))?;
        if payload.len() > limit {
            return Err(ResponseTooLargeError::new(tool, payload.len(), limit).into());
        }
        Ok(())
    }
}

#[tool_router]
impl ExcelServer {
    #[tool(
        name = "read_excel_file",
        description = "Read rows from a sheet as header-keyed records"
    )]
    pub async fn read_excel_file(
        &self,
        Parameters(params): Parameters<tools::ReadExcelFileParams>,
    ) -> Result<Json<ToolReply>, McpError> {
        self.run_tool("read_excel_file", tools::read_excel_file(params))
            .await
    }

    #[tool(
        name = "get_excel_summary",
        description = "Summarize sheets, dimensions, and headers with a bounded preview"
    )]
    pub async fn get_excel_summary(
        &self,
        Parameters(params): Parameters<tools::GetExcelSummaryParams>,
    ) -> Result<Json<ToolReply>, McpError> {
        self.run_tool("get_excel_summary", tools::get_excel_summary(params))
            .await
    }

    #[tool(
        name = "search_excel_data",
        description = "Search one column by exact or contains match"
    )]
    pub async fn search_excel_data(
        &self,
        Parameters(params): Parameters<tools::SearchExcelDataParams>,
    ) -> Result<Json<ToolReply>, McpError> {
        self.run_tool("search_excel_data", tools::search_excel_data(params))
            .await
    }

    #[tool(
        name = "insert_excel_rows",
        description = "Insert validated rows at end/beginning/after_row_<N>, preserving formatting and formulas"
    )]
    pub async fn insert_excel_rows(
        &self,
        Parameters(params): Parameters<tools::InsertExcelRowsParams>,
    ) -> Result<Json<ToolReply>, McpError> {
        self.run_tool("insert_excel_rows", tools::insert_excel_rows(params))
            .await
    }

    #[tool(
        name = "delete_excel_row",
        description = "Delete a single data row (the header row is protected)"
    )]
    pub async fn delete_excel_row(
        &self,
        Parameters(params): Parameters<tools::DeleteExcelRowParams>,
    ) -> Result<Json<ToolReply>, McpError> {
        self.run_tool("delete_excel_row", tools::delete_excel_row(params))
            .await
    }

    #[tool(
        name = "set_cell_text",
        description = "Write plain text into one cell; formulas are rejected"
    )]
    pub async fn set_cell_text(
        &self,
        Parameters(params): Parameters<tools::SetCellTextParams>,
    ) -> Result<Json<ToolReply>, McpError> {
        self.run_tool("set_cell_text", tools::set_cell_text(params))
            .await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for ExcelServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(BASE_INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }
}

fn to_mcp_error_for_tool(tool: &str, error: anyhow::Error) -> McpError {
    if error.is::<ToolDisabledError>() || error.is::<ResponseTooLargeError>() {
        return McpError::invalid_request(error.to_string(), None);
    }

    if let Some(serde_err) = error.downcast_ref::<serde_json::Error>() {
        let problem = serde_err.to_string();
        let variants = extract_expected_variants(&problem);
        return McpError::invalid_params(
            format_invalid_params_message(tool, &problem, &variants),
            None,
        );
    }

    let problem = error.to_string();
    if looks_like_invalid_params(&problem) {
        let variants = extract_expected_variants(&problem);
        return McpError::invalid_params(
            format_invalid_params_message(tool, &problem, &variants),
            None,
        );
    }

    McpError::internal_error(problem, None)
}

fn format_invalid_params_message(tool: &str, problem: &str, variants: &[String]) -> String {
    let mut out = format!("Invalid params for tool '{tool}': {problem}");
    if !variants.is_empty() {
        out.push_str("\nvalid variants: ");
        out.push_str(&variants.join(", "));
    }
    if let Some(example) = tool_minimal_example(tool) {
        out.push_str("\nexample: ");
        out.push_str(example);
    }
    out
}

fn tool_minimal_example(tool: &str) -> Option<&'static str> {
    match tool {
        "insert_excel_rows" => Some(
            r#"{"file_path":"data.xlsx","row_data":[{"Name":"Ada","Age":36}],"insert_position":"end"}"#,
        ),
        "set_cell_text" => Some(
            r#"{"file_path":"data.xlsx","row_number":2,"column_number":1,"text_content":"Ada"}"#,
        ),
        "search_excel_data" => Some(
            r#"{"file_path":"data.xlsx","column_name":"Name","search_value":"Ada","match_type":"exact"}"#,
        ),
        _ => None,
    }
}

fn looks_like_invalid_params(problem: &str) -> bool {
    let p = problem.to_ascii_lowercase();
    p.contains("missing field")
        || p.contains("unknown field")
        || p.contains("unknown variant")
        || p.contains("did not match any variant")
        || p.contains("must be an object")
}

fn extract_expected_variants(problem: &str) -> Vec<String> {
    static EXPECTED_TAIL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"expected(?: one of)? (?P<tail>.*)$").expect("regex"));
    static BACKTICK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("regex"));

    let Some(caps) = EXPECTED_TAIL_RE.captures(problem) else {
        return Vec::new();
    };
    let tail = caps.name("tail").map(|m| m.as_str()).unwrap_or("");
    BACKTICK_RE
        .captures_iter(tail)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
