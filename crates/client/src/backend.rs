use crate::{ClientError, ClientResult};
use api_shared::{ErrorRes, LabSearchRes};
use async_trait::async_trait;
use lablink_core::{LabSearchPage, LabSearchParams};
use std::time::Duration;

const DEFAULT_ERROR: &str = "Failed to fetch labs";

/// Source of lab search pages.
#[async_trait]
pub trait LabSearchBackend: Send + Sync {
    async fn search(&self, params: &LabSearchParams) -> ClientResult<LabSearchPage>;
}

/// Calls `GET {base}/labs/search` on a LabLink REST server.
#[derive(Clone, Debug)]
pub struct HttpLabSearchBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpLabSearchBackend {
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` if `base_url` is not an http(s) URL, or
    /// `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lablink-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { base_url, http })
    }
}

#[async_trait]
impl LabSearchBackend for HttpLabSearchBackend {
    async fn search(&self, params: &LabSearchParams) -> ClientResult<LabSearchPage> {
        let response = self
            .http
            .get(format!("{}/labs/search", self.base_url))
            .query(&params.to_query_pairs())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorRes>(&body)
                .map(|e| e.error)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_ERROR.to_string());
            return Err(ClientError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let res: LabSearchRes = serde_json::from_str(&body).map_err(ClientError::Decode)?;
        Ok(LabSearchPage {
            results: res.labs.into_iter().map(Into::into).collect(),
            next_page_token: res.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}
