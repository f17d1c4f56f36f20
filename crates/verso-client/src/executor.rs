//! Request execution.
//!
//! Adapters never call the network directly; every request passes through a
//! [`RequestExecutor`] injected via the context, which lets tests substitute
//! a scripted executor for the real HTTP client.

use std::sync::Arc;

use reqwest::Client;
use url::Url;
use verso_core::Result;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::TRACING_TARGET;
use crate::request::{ApiRequest, CacheMode, Method};
use crate::response::ApiResponse;

/// Performs unsent requests.
#[async_trait::async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Sends the request and collects the response.
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Inner state holding the HTTP client and configuration.
struct HttpExecutorInner {
    http: Client,
    config: ClientConfig,
}

/// Reqwest-based request executor.
#[derive(Clone)]
pub struct HttpExecutor {
    inner: Arc<HttpExecutorInner>,
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpExecutor {
    /// Creates a new executor with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            "Creating HTTP executor"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            inner: Arc::new(HttpExecutorInner { http, config }),
        })
    }

    /// Creates a new executor with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Gets the executor configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn build_url(&self, request: &ApiRequest) -> std::result::Result<Url, Error> {
        let mut url = Url::parse(&request.url)?;
        if !request.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RequestExecutor for HttpExecutor {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.build_url(&request)?;

        tracing::debug!(
            target: TRACING_TARGET,
            method = request.method.as_ref(),
            url = %url,
            "Performing request"
        );

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.inner.http.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if matches!(request.cache, CacheMode::NoStore) {
            builder = builder.header("Cache-Control", "no-store");
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Error::from)?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            status,
            body_len = body.len(),
            "Request completed"
        );

        Ok(ApiResponse::new(status, headers, body))
    }
}
