mod support;

use assert_matches::assert_matches;
use excel_mcp::errors::OpError;
use excel_mcp::model::{CellValue, MatchType};
use excel_mcp::tools::{
    self, DeleteExcelRowParams, GetExcelSummaryParams, ReadExcelFileParams, SearchExcelDataParams,
    SetCellTextParams,
};
use excel_mcp::workbook;
use serde_json::json;
use support::builders::{CellVal, read_back, table_file};
use tempfile::TempDir;
use umya_spreadsheet::HorizontalAlignmentValues;

fn people_file(dir: &TempDir) -> std::path::PathBuf {
    table_file(dir, "people.xlsx", &["Name", "Age"], &[
        [CellVal::from("Ada"), CellVal::from(36)],
        [CellVal::from("Grace"), CellVal::from(45)],
        [CellVal::from("Alan"), CellVal::from(41)],
    ])
}

#[tokio::test]
async fn read_returns_header_keyed_records() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: ReadExcelFileParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap()
    }))
    .unwrap();
    let response = tools::read_excel_file(params).await.unwrap();

    assert_eq!(response.columns, vec!["Name", "Age"]);
    assert_eq!(response.row_count, 3);
    assert_eq!(response.column_count, 2);
    assert!(!response.truncated);
    assert_eq!(response.rows[0]["Name"], CellValue::Text("Ada".into()));
    assert_eq!(response.rows[0]["Age"], CellValue::Number(36.0));
    assert_eq!(response.available_sheets, vec!["Sheet1"]);
}

#[tokio::test]
async fn read_truncates_at_max_rows() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: ReadExcelFileParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "max_rows": 2
    }))
    .unwrap();
    let response = tools::read_excel_file(params).await.unwrap();

    assert_eq!(response.row_count, 2);
    assert!(response.truncated);
}

#[tokio::test]
async fn insert_then_read_round_trips_values() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let insert: tools::InsertExcelRowsParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_data": {"Name": "Katherine", "Age": 44}
    }))
    .unwrap();
    tools::insert_excel_rows(insert).await.unwrap();

    let read: ReadExcelFileParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap()
    }))
    .unwrap();
    let response = tools::read_excel_file(read).await.unwrap();
    let last = response.rows.last().unwrap();
    assert_eq!(last["Name"], CellValue::Text("Katherine".into()));
    assert_eq!(last["Age"], CellValue::Number(44.0));
}

#[tokio::test]
async fn summary_reports_dimensions_and_preview() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: GetExcelSummaryParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "preview_rows": 2
    }))
    .unwrap();
    let response = tools::get_excel_summary(params).await.unwrap();

    assert_eq!(response.sheet_count, 1);
    assert_eq!(response.total_data_rows, 3);
    assert_eq!(response.sheets[0].data_rows, 3);
    assert_eq!(response.sheets[0].columns, 2);
    assert_eq!(response.sheets[0].headers, vec!["Name", "Age"]);
    assert_eq!(response.preview_rows.len(), 2);
    assert_eq!(response.preview_sheet, "Sheet1");
}

#[tokio::test]
async fn summary_falls_back_to_first_sheet_for_unknown_target() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: GetExcelSummaryParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "target_sheet": "Nope"
    }))
    .unwrap();
    let response = tools::get_excel_summary(params).await.unwrap();
    assert_eq!(response.preview_sheet, "Sheet1");
}

#[tokio::test]
async fn search_exact_matches_numbers() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SearchExcelDataParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "column_name": "Age",
        "search_value": 45
    }))
    .unwrap();
    let response = tools::search_excel_data(params).await.unwrap();

    assert_eq!(response.match_count, 1);
    assert_eq!(response.matches[0].row_number, 3);
    assert_eq!(
        response.matches[0].row_data["Name"],
        CellValue::Text("Grace".into())
    );
}

#[tokio::test]
async fn search_contains_matches_substrings() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SearchExcelDataParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "column_name": "Name",
        "search_value": "la",
        "match_type": "contains"
    }))
    .unwrap();
    let response = tools::search_excel_data(params).await.unwrap();

    assert_eq!(response.match_count, 1);
    assert_eq!(
        response.matches[0].value,
        CellValue::Text("Alan".into())
    );
}

#[tokio::test]
async fn contains_matching_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SearchExcelDataParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "column_name": "Name",
        "search_value": "ada",
        "match_type": "contains"
    }))
    .unwrap();
    let response = tools::search_excel_data(params).await.unwrap();

    assert_eq!(response.match_count, 1);
    assert_eq!(response.matches[0].value, CellValue::Text("Ada".into()));
}

#[tokio::test]
async fn contains_scans_the_string_form_of_numeric_cells() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SearchExcelDataParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "column_name": "Age",
        "search_value": "4",
        "match_type": "contains"
    }))
    .unwrap();
    let response = tools::search_excel_data(params).await.unwrap();

    // "4" appears in 45 and 41 but not 36.
    assert_eq!(response.match_count, 2);
    assert_eq!(response.matches[0].row_number, 3);
    assert_eq!(response.matches[1].row_number, 4);
}

#[tokio::test]
async fn contains_with_non_string_value_falls_back_to_exact() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SearchExcelDataParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "column_name": "Age",
        "search_value": 41,
        "match_type": "contains"
    }))
    .unwrap();
    let response = tools::search_excel_data(params).await.unwrap();

    assert_eq!(response.match_type, MatchType::Exact);
    assert_eq!(response.match_count, 1);
    assert_eq!(response.matches[0].row_number, 4);
}

#[tokio::test]
async fn search_unknown_column_enumerates_available() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SearchExcelDataParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "column_name": "Salary",
        "search_value": 1
    }))
    .unwrap();
    let err = tools::search_excel_data(params).await.unwrap_err();

    assert_matches!(err, OpError::ColumnNotFound { .. });
    let message = err.to_string();
    assert!(message.contains("Name"));
    assert!(message.contains("Age"));
}

#[tokio::test]
async fn delete_removes_a_data_row_and_reports_its_contents() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: DeleteExcelRowParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 3
    }))
    .unwrap();
    let response = tools::delete_excel_row(params).await.unwrap();

    assert_eq!(response.deleted_row, 3);
    assert_eq!(response.deleted_data["Name"], CellValue::Text("Grace".into()));
    assert_eq!(response.remaining_rows, 3);
    assert_eq!(response.data_rows, 2);

    let book = read_back(&path);
    let sheet = book.get_sheet(&0).unwrap();
    assert_eq!(
        workbook::read_cell(sheet, 1, 3),
        CellValue::Text("Alan".into())
    );
}

#[tokio::test]
async fn delete_protects_the_header_row() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: DeleteExcelRowParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 1
    }))
    .unwrap();
    let err = tools::delete_excel_row(params).await.unwrap_err();
    assert_matches!(err, OpError::InvalidRow { row: 1, .. });
}

#[tokio::test]
async fn deleting_the_last_data_row_then_again_hits_no_data_rows() {
    let dir = TempDir::new().unwrap();
    let path = table_file(&dir, "single.xlsx", &["Name"], &[[CellVal::from("only")]]);

    let params: DeleteExcelRowParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 2
    }))
    .unwrap();
    let response = tools::delete_excel_row(params.clone()).await.unwrap();
    assert_eq!(response.data_rows, 0);

    let err = tools::delete_excel_row(params).await.unwrap_err();
    assert_matches!(err, OpError::NoDataRows);
}

#[tokio::test]
async fn delete_beyond_extent_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: DeleteExcelRowParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 99
    }))
    .unwrap();
    let err = tools::delete_excel_row(params).await.unwrap_err();
    assert_matches!(err, OpError::InvalidRow { row: 99, .. });
}

#[tokio::test]
async fn set_cell_text_reports_previous_value_and_label() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SetCellTextParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 2,
        "column_number": 1,
        "text_content": "Augusta"
    }))
    .unwrap();
    let response = tools::set_cell_text(params).await.unwrap();

    assert_eq!(response.cell, "A2");
    assert_eq!(response.previous_value, CellValue::Text("Ada".into()));

    let book = read_back(&path);
    let sheet = book.get_sheet(&0).unwrap();
    assert_eq!(
        workbook::read_cell(sheet, 1, 2),
        CellValue::Text("Augusta".into())
    );
}

#[tokio::test]
async fn set_cell_text_is_idempotent_including_alignment() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SetCellTextParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 2,
        "column_number": 2,
        "text_content": "unchanged"
    }))
    .unwrap();

    tools::set_cell_text(params.clone()).await.unwrap();
    let second = tools::set_cell_text(params).await.unwrap();
    assert_eq!(second.previous_value, CellValue::Text("unchanged".into()));

    let book = read_back(&path);
    let sheet = book.get_sheet(&0).unwrap();
    let style = sheet.get_cell((2u32, 2u32)).unwrap().get_style();
    let alignment = style.get_alignment().expect("alignment forced");
    assert_eq!(alignment.get_horizontal(), &HorizontalAlignmentValues::Left);
}

#[tokio::test]
async fn set_cell_text_rejects_formulas_and_leaves_the_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: SetCellTextParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "row_number": 2,
        "column_number": 1,
        "text_content": "=SUM(A1:A2)"
    }))
    .unwrap();
    let err = tools::set_cell_text(params).await.unwrap_err();
    assert_matches!(err, OpError::FormulaNotAllowed);

    let book = read_back(&path);
    let sheet = book.get_sheet(&0).unwrap();
    assert_eq!(
        workbook::read_cell(sheet, 1, 2),
        CellValue::Text("Ada".into())
    );
}

#[tokio::test]
async fn set_cell_text_rejects_out_of_range_targets() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    for (row, col) in [(0u32, 1u32), (1_048_577, 1), (1, 0), (1, 16_385)] {
        let params: SetCellTextParams = serde_json::from_value(json!({
            "file_path": path.to_str().unwrap(),
            "row_number": row,
            "column_number": col,
            "text_content": "x"
        }))
        .unwrap();
        let err = tools::set_cell_text(params).await.unwrap_err();
        assert_matches!(err, OpError::InvalidCell { .. });
    }
}

#[tokio::test]
async fn unknown_sheet_error_enumerates_names() {
    let dir = TempDir::new().unwrap();
    let path = people_file(&dir);

    let params: ReadExcelFileParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "sheet_name": "Budget"
    }))
    .unwrap();
    let err = tools::read_excel_file(params).await.unwrap_err();

    assert_matches!(err, OpError::SheetNotFound { .. });
    assert!(err.to_string().contains("Sheet1"));
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let params: ReadExcelFileParams = serde_json::from_value(json!({
        "file_path": "/tmp/data.csv"
    }))
    .unwrap();
    let err = tools::read_excel_file(params).await.unwrap_err();
    assert_matches!(err, OpError::UnsupportedFormat { .. });
}

#[tokio::test]
async fn multi_sheet_summary_counts_every_sheet() {
    let dir = TempDir::new().unwrap();
    let path = {
        let mut book = umya_spreadsheet::new_file();
        support::builders::fill_table(
            book.get_sheet_mut(&0).unwrap(),
            &["Name"],
            &[[CellVal::from("a")], [CellVal::from("b")]],
        );
        let second = book.new_sheet("Extras").unwrap();
        support::builders::fill_table(second, &["Item"], &[[CellVal::from("x")]]);
        let path = dir.path().join("multi.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
        path
    };

    let params: GetExcelSummaryParams = serde_json::from_value(json!({
        "file_path": path.to_str().unwrap(),
        "target_sheet": "Extras"
    }))
    .unwrap();
    let response = tools::get_excel_summary(params).await.unwrap();

    assert_eq!(response.sheet_count, 2);
    assert_eq!(response.total_data_rows, 3);
    assert_eq!(response.preview_sheet, "Extras");
    assert_eq!(response.preview_rows[0]["Item"], CellValue::Text("x".into()));
}
