//! Notion REST API client.
//!
//! Database queries, search, and appending blocks to a page.

use crate::notes::ParagraphBlock;
use crate::notion::pagination::{paginate, Page};
use futures::Stream;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// A failure of the Notion data source itself.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request to Notion timed out after {0}s")]
    Timeout(u64),
    #[error("Cannot connect to Notion at {0}")]
    Connect(String),
    #[error("Failed to send request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Malformed Notion response: {0}")]
    Malformed(String),
}

/// Connection settings for [`NotionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub token: String,
    pub timeout_seconds: u64,
    pub page_size: usize,
}

/// Error body returned by the Notion API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Most children Notion accepts in one append request.
const MAX_CHILDREN_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

/// Client for the Notion API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotionClient {
    config: Arc<ClientConfig>,
    http_client: reqwest::Client,
}

impl NotionClient {
    pub fn new(config: ClientConfig) -> Result<Self, SourceError> {
        info!(
            "Initializing Notion client for {} (version {})",
            config.api_url, config.api_version
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Stream every page of a database, optionally filtered.
    ///
    /// Pages are requested lazily as the stream is consumed.
    pub fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> impl Stream<Item = Result<Value, SourceError>> {
        let client = self.clone();
        let database_id = database_id.to_string();

        paginate(move |cursor| {
            let client = client.clone();
            let database_id = database_id.clone();
            let filter = filter.clone();
            async move {
                client
                    .query_page(&database_id, filter.as_ref(), cursor)
                    .await
            }
        })
    }

    /// Find the first database whose title matches `title`.
    pub async fn search_database(&self, title: &str) -> Result<Option<String>, SourceError> {
        let body = json!({
            "query": title,
            "filter": { "property": "object", "value": "database" },
        });

        let page: Page<SearchHit> = self.send(Method::POST, "/v1/search", &body).await?;
        Ok(page.results.into_iter().next().map(|hit| hit.id))
    }

    /// Append paragraph blocks to the end of a page or block.
    ///
    /// Large appends are sent in several requests, in order.
    pub async fn append_block_children(
        &self,
        block_id: &str,
        children: &[ParagraphBlock],
    ) -> Result<(), SourceError> {
        let path = format!("/v1/blocks/{}/children", block_id);

        for chunk in children.chunks(MAX_CHILDREN_PER_REQUEST) {
            let body = json!({ "children": chunk });
            let _: Value = self.send(Method::PATCH, &path, &body).await?;
        }

        debug!("Appended {} blocks to {}", children.len(), block_id);
        Ok(())
    }

    async fn query_page(
        &self,
        database_id: &str,
        filter: Option<&Value>,
        cursor: Option<String>,
    ) -> Result<Page<Value>, SourceError> {
        let path = format!("/v1/databases/{}/query", database_id);
        let body = query_body(self.config.page_size, filter, cursor);
        self.send(Method::POST, &path, &body).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        debug!("{} {}", method, url);

        let response = self
            .http_client
            .request(method, &url)
            .bearer_auth(&self.config.token)
            .header("Notion-Version", &self.config.api_version)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    SourceError::Connect(self.config.api_url.clone())
                } else {
                    SourceError::Http(e)
                }
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body: ApiErrorBody =
                serde_json::from_str(&text).unwrap_or_else(|_| ApiErrorBody {
                    code: String::new(),
                    message: text.clone(),
                });
            return Err(SourceError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            });
        }

        serde_json::from_str(&text).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

/// Build a database query body.
fn query_body(page_size: usize, filter: Option<&Value>, cursor: Option<String>) -> Value {
    let mut body = json!({ "page_size": page_size });
    if let Some(filter) = filter {
        body["filter"] = filter.clone();
    }
    if let Some(cursor) = cursor {
        body["start_cursor"] = Value::String(cursor);
    }
    body
}

/// Filter matching rows whose select property equals `value`.
pub fn select_equals(property: &str, value: &str) -> Value {
    json!({
        "property": property,
        "select": { "equals": value },
    })
}

/// Filter matching rows whose rich-text property is not empty.
pub fn rich_text_not_empty(property: &str) -> Value {
    json!({
        "property": property,
        "rich_text": { "is_not_empty": true },
    })
}
