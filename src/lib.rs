pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod server;
pub mod state;
pub mod tools;
pub mod workbook;
