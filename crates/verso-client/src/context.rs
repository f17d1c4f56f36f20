//! Per-call context.
//!
//! A [`Context`] is an immutable configuration bag threaded explicitly
//! through every provider operation: API root, repository identifier,
//! branch, credential source, cache handle, and the request executor. It is
//! built once per logical session; when a call needs an override a derived
//! context is produced, the original is never mutated. No component holds a
//! reference back to the wrapper that built it.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use verso_core::{CacheStore, Credentials, Result, cache_key};

use crate::TRACING_TARGET;
use crate::executor::RequestExecutor;
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Supplies session credentials for request authorization.
///
/// The wrapper's authentication gate implements this, so authorization may
/// suspend until the user has authenticated.
#[async_trait::async_trait]
pub trait CredentialsSource: Send + Sync {
    /// Returns the session credentials, waiting for authentication when
    /// still pending.
    async fn credentials(&self) -> Result<Credentials>;
}

/// A fixed credential source, used while verifying candidate credentials
/// before the session gate has settled.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

#[async_trait::async_trait]
impl CredentialsSource for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.0.clone())
    }
}

#[async_trait::async_trait]
impl CredentialsSource for crate::auth::AuthGate {
    async fn credentials(&self) -> Result<Credentials> {
        crate::auth::AuthGate::credentials(self).await
    }
}

struct ContextInner {
    backend: String,
    api_root: String,
    repo: String,
    branch: String,
    credentials: Arc<dyn CredentialsSource>,
    executor: Arc<dyn RequestExecutor>,
    cache: Arc<dyn CacheStore>,
}

/// Immutable per-call configuration bag.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("backend", &self.inner.backend)
            .field("api_root", &self.inner.api_root)
            .field("repo", &self.inner.repo)
            .field("branch", &self.inner.branch)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Context`].
pub struct ContextBuilder {
    backend: String,
    api_root: String,
    repo: String,
    branch: String,
    credentials: Option<Arc<dyn CredentialsSource>>,
    executor: Option<Arc<dyn RequestExecutor>>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl ContextBuilder {
    /// Sets the API root URL.
    #[must_use]
    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Sets the repository identifier.
    #[must_use]
    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    /// Sets the branch name.
    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the credential source.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the request executor.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the content cache.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the context.
    ///
    /// Fails with a configuration error when the executor or credential
    /// source is missing.
    pub fn build(self) -> Result<Context> {
        let credentials = self.credentials.ok_or_else(|| {
            verso_core::Error::configuration().with_message("context requires a credential source")
        })?;
        let executor = self.executor.ok_or_else(|| {
            verso_core::Error::configuration().with_message("context requires a request executor")
        })?;
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(verso_core::MemoryCache::new()));

        Ok(Context {
            inner: Arc::new(ContextInner {
                backend: self.backend,
                api_root: self.api_root,
                repo: self.repo,
                branch: self.branch,
                credentials,
                executor,
                cache,
            }),
        })
    }
}

impl Context {
    /// Starts building a context for the named backend.
    pub fn builder(backend: impl Into<String>) -> ContextBuilder {
        ContextBuilder {
            backend: backend.into(),
            api_root: String::new(),
            repo: String::new(),
            branch: "master".to_owned(),
            credentials: None,
            executor: None,
            cache: None,
        }
    }

    /// Backend name, used as the cache namespace.
    pub fn backend(&self) -> &str {
        &self.inner.backend
    }

    /// API root URL.
    pub fn api_root(&self) -> &str {
        &self.inner.api_root
    }

    /// Repository identifier.
    pub fn repo(&self) -> &str {
        &self.inner.repo
    }

    /// Branch name.
    pub fn branch(&self) -> &str {
        &self.inner.branch
    }

    /// Derives a context targeting a different repository.
    #[must_use]
    pub fn with_repo(&self, repo: impl Into<String>) -> Self {
        self.derive(|inner| inner.repo = repo.into())
    }

    /// Derives a context targeting a different branch.
    #[must_use]
    pub fn with_branch(&self, branch: impl Into<String>) -> Self {
        self.derive(|inner| inner.branch = branch.into())
    }

    /// Derives a context with a different credential source.
    #[must_use]
    pub fn with_credentials(&self, credentials: Arc<dyn CredentialsSource>) -> Self {
        self.derive(|inner| inner.credentials = credentials)
    }

    fn derive(&self, apply: impl FnOnce(&mut ContextInner)) -> Self {
        let mut inner = ContextInner {
            backend: self.inner.backend.clone(),
            api_root: self.inner.api_root.clone(),
            repo: self.inner.repo.clone(),
            branch: self.inner.branch.clone(),
            credentials: Arc::clone(&self.inner.credentials),
            executor: Arc::clone(&self.inner.executor),
            cache: Arc::clone(&self.inner.cache),
        };
        apply(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Attaches a bearer token from the credential source.
    pub async fn authorize(&self, request: ApiRequest) -> Result<ApiRequest> {
        let credentials = self.inner.credentials.credentials().await?;
        Ok(request.authorize(&credentials.token))
    }

    /// Applies root, authorization, and timestamp to an unsent request.
    pub async fn prepare(&self, request: ApiRequest) -> Result<ApiRequest> {
        let request = self
            .authorize(request.with_root(&self.inner.api_root))
            .await?;
        Ok(request.with_timestamp())
    }

    /// Prepares and performs a request through the injected executor.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let prepared = self.prepare(request).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            backend = %self.inner.backend,
            method = prepared.method.as_ref(),
            url = %prepared.url,
            "Dispatching request"
        );
        self.inner.executor.perform(prepared).await
    }

    /// Performs a request and parses a JSON body.
    pub async fn request_json(&self, request: ApiRequest) -> Result<Value> {
        let request = request.with_default_headers([("Content-Type", "application/json")]);
        let response = self.request(request).await?.error_for_status()?;
        response.parse_json()
    }

    /// Performs a request and parses a UTF-8 text body.
    pub async fn request_text(&self, request: ApiRequest) -> Result<String> {
        let request = request.with_default_headers([("Content-Type", "text/plain")]);
        let response = self.request(request).await?.error_for_status()?;
        response.parse_text()
    }

    /// Performs a request and returns the raw body.
    pub async fn request_blob(&self, request: ApiRequest) -> Result<Bytes> {
        let response = self.request(request).await?.error_for_status()?;
        Ok(response.parse_blob())
    }

    /// Looks up previously fetched content by stable id.
    pub async fn cached(&self, id: &str) -> Option<Bytes> {
        self.inner
            .cache
            .get(&cache_key(&self.inner.backend, id))
            .await
    }

    /// Stores fetched content under its stable id (write-through).
    pub async fn store(&self, id: &str, value: Bytes) {
        self.inner
            .cache
            .set(&cache_key(&self.inner.backend, id), value)
            .await;
    }
}
