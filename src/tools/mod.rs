pub mod mutate;
pub mod query;

pub use mutate::{
    DeleteExcelRowParams, InsertExcelRowsParams, SetCellTextParams, delete_excel_row,
    insert_excel_rows, set_cell_text,
};
pub use query::{
    GetExcelSummaryParams, ReadExcelFileParams, SearchExcelDataParams, get_excel_summary,
    read_excel_file, search_excel_data,
};
