use super::response::{ensure_success, parse_create_response, parse_list_response};
use crate::error::{Result, UserdeskError};
use crate::models::{Record, RecordDraft};
use std::future::Future;
use tracing::debug;
use url::Url;

/// The remote user-record API.
///
/// Every call carries the bearer token it should be authorized with.
pub trait RecordApi: Send + Sync {
    fn list(&self, token: &str) -> impl Future<Output = Result<Vec<Record>>> + Send;

    fn create(
        &self,
        token: &str,
        draft: &RecordDraft,
    ) -> impl Future<Output = Result<Record>> + Send;

    fn update(
        &self,
        token: &str,
        id: &str,
        draft: &RecordDraft,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, token: &str, id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// JSON-over-HTTP client for the `/users` collection.
#[derive(Clone)]
pub struct HttpRecordApi {
    collection: Url,
    http: reqwest::Client,
}

impl HttpRecordApi {
    /// `base_url` is the server root; requests go to `<base_url>/users`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut collection = Url::parse(base_url)
            .map_err(|e| UserdeskError::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if !matches!(collection.scheme(), "http" | "https") {
            return Err(UserdeskError::Config(format!(
                "API URL must be http or https: {}",
                base_url
            )));
        }
        collection
            .path_segments_mut()
            .map_err(|_| UserdeskError::Config(format!("API URL cannot be a base: {}", base_url)))?
            .pop_if_empty()
            .push("users");

        Ok(Self {
            collection,
            http: reqwest::Client::new(),
        })
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    /// `<collection>/<id>` with the id percent-encoded as one segment.
    pub fn record_url(&self, id: &str) -> Url {
        let mut url = self.collection.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }
}

impl RecordApi for HttpRecordApi {
    async fn list(&self, token: &str) -> Result<Vec<Record>> {
        debug!(url = %self.collection, "GET");
        let response = self
            .http
            .get(self.collection.clone())
            .bearer_auth(token)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        parse_list_response(&response.text().await?)
    }

    async fn create(&self, token: &str, draft: &RecordDraft) -> Result<Record> {
        debug!(url = %self.collection, "POST");
        let response = self
            .http
            .post(self.collection.clone())
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        parse_create_response(&response.text().await?)
    }

    async fn update(&self, token: &str, id: &str, draft: &RecordDraft) -> Result<()> {
        let url = self.record_url(id);
        debug!(%url, "PUT");
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, token: &str, id: &str) -> Result<()> {
        let url = self.record_url(id);
        debug!(%url, "DELETE");
        let response = self.http.delete(url).bearer_auth(token).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}
