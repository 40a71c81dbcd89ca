// src/api/http.rs

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::api::{GraphSource, SelectorEvaluator};
use crate::dag::model::{DagPayload, ModelPreview, SelectorResult};
use crate::errors::{ConsoleError, Result};

const DAG_PATH: &str = "/api/dag/";
const SELECT_PATH: &str = "/api/dag/select";
const MODEL_PATH: &str = "/api/dag/model/";

/// Client for the backend REST API.
///
/// Failures are returned as-is and never retried here; callers decide
/// whether to re-trigger.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl HttpApi {
    pub fn new(api_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), api_url)
    }

    pub fn with_client(client: Client, api_url: &str) -> Result<Self> {
        // Parse once so a bad base URL fails here rather than on first use.
        Url::parse(api_url).map_err(|e| {
            ConsoleError::ConfigError(format!("invalid API URL ({api_url}): {e}"))
        })?;
        Ok(Self {
            client,
            base: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base, path);
        Url::parse(&raw)
            .map_err(|e| ConsoleError::ConfigError(format!("invalid API URL ({raw}): {e}")))
    }

    /// `GET /api/dag/`
    pub async fn dag(&self) -> Result<DagPayload> {
        let url = self.url(DAG_PATH)?;
        self.get_json(url).await
    }

    /// `GET /api/dag/select?selector=<url-encoded selector>`
    pub async fn select(&self, selector: &str) -> Result<SelectorResult> {
        let mut url = self.url(SELECT_PATH)?;
        url.query_pairs_mut().append_pair("selector", selector);
        self.get_json(url).await
    }

    /// `GET /api/dag/model/<name>?limit=<limit>`
    pub async fn model_preview(&self, model_name: &str, limit: u32) -> Result<ModelPreview> {
        let mut url = self.url(MODEL_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ConsoleError::ConfigError("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(model_name);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Map non-success responses to `ApiError`, using the body's `detail` when
/// the backend provides one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    Err(ConsoleError::ApiError {
        status: status.as_u16(),
        detail,
    })
}

impl GraphSource for HttpApi {
    fn fetch_graph(&self) -> Pin<Box<dyn Future<Output = Result<DagPayload>> + Send + '_>> {
        Box::pin(self.dag())
    }
}

impl SelectorEvaluator for HttpApi {
    fn evaluate<'a>(
        &'a self,
        selector: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SelectorResult>> + Send + 'a>> {
        Box::pin(self.select(selector))
    }
}
