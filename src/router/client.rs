use reqwest::Client;
use tracing::{debug, warn};

use crate::filter::{translate, wire::to_wire};
use crate::search::{SearchRequest, SearchResultRow};

pub const DEV_API_BASE: &str = "http://localhost:3333";
pub const PROD_API_BASE: &str = "https://api.ffxivteamcraft.com";

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("search API unreachable: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("search API error ({code}): {message}")]
    Status { code: u16, message: String },

    #[error("invalid search API response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RemoteError::Connect(e)
        } else if e.is_decode() {
            RemoteError::Decode(e)
        } else {
            RemoteError::Network(e)
        }
    }
}

/// Query string for the hosted search API. Filters use the compact wire
/// grammar and are omitted when empty; sort parameters are omitted when no
/// sort field is set so the server applies its default ordering.
pub fn remote_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("query", request.query().to_string()),
        ("type", request.content_type().name().to_string()),
        ("lang", request.language().code().to_string()),
    ];
    let predicates = translate(request.filters());
    if !predicates.is_empty() {
        params.push(("filters", to_wire(&predicates)));
    }
    if let Some(field) = &request.sort().field {
        params.push(("sort_field", field.clone()));
        params.push(("sort_order", request.sort().order.as_str().to_string()));
    }
    params
}

#[derive(Clone)]
pub struct RemoteSearchClient {
    http: Client,
    dev_url: String,
    prod_url: String,
}

impl RemoteSearchClient {
    pub fn new(http: Client, dev_url: &str, prod_url: &str) -> Self {
        Self {
            http,
            dev_url: dev_url.trim_end_matches('/').to_string(),
            prod_url: prod_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search_prod(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResultRow>, RemoteError> {
        self.fetch(&self.prod_url, &remote_params(request)).await
    }

    /// Queries the development API, retrying against production only when
    /// the development endpoint cannot be reached. Error statuses from the
    /// development API are returned as-is.
    pub async fn search_dev(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResultRow>, RemoteError> {
        let params = remote_params(request);
        match self.fetch(&self.dev_url, &params).await {
            Err(RemoteError::Connect(e)) => {
                warn!(error = %e, "dev search API unreachable, using production");
                self.fetch(&self.prod_url, &params).await
            }
            other => other,
        }
    }

    async fn fetch(
        &self,
        base: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<SearchResultRow>, RemoteError> {
        let url = format!("{base}/search");
        let response = self
            .http
            .get(&url)
            .header("User-Agent", crate::USER_AGENT)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet = if text.len() > 200 {
                &text[..text.floor_char_boundary(200)]
            } else {
                &text
            };
            warn!(status = %status, "search API error");
            return Err(RemoteError::Status {
                code: status.as_u16(),
                message: snippet.to_string(),
            });
        }

        let rows: Vec<SearchResultRow> = response.json().await?;
        debug!(url = %url, rows = rows.len(), "remote search complete");
        Ok(rows)
    }
}
