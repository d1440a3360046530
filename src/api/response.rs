use super::models::{CreateResponse, ListResponse};
use crate::error::{Result, UserdeskError};
use crate::models::Record;

/// Turn a non-2xx response into an API error carrying the body text.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(UserdeskError::Api { status, message })
}

/// Parse a list body. A missing or null `users` field is an empty list.
pub fn parse_list_response(body: &str) -> Result<Vec<Record>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: ListResponse = serde_json::from_str(body)?;
    Ok(parsed.users.unwrap_or_default())
}

/// Parse a create body into the server-assigned record.
pub fn parse_create_response(body: &str) -> Result<Record> {
    let parsed: CreateResponse = serde_json::from_str(body)?;
    Ok(parsed.user)
}
