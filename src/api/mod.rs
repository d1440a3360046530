pub mod client;
pub mod models;
pub mod response;

pub use client::{HttpRecordApi, RecordApi};
pub use response::{ensure_success, parse_create_response, parse_list_response};
