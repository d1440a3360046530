use crate::models::Record;
use serde::Deserialize;

/// `GET /users`
#[derive(Deserialize, Debug, Default)]
pub struct ListResponse {
    #[serde(default)]
    pub users: Option<Vec<Record>>,
}

/// `POST /users`
#[derive(Deserialize, Debug)]
pub struct CreateResponse {
    pub user: Record,
}
