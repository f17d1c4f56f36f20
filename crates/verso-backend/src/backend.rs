//! Generic backend wrapper.
//!
//! Adapts any [`Provider`] into a uniform contract. The wrapper owns the
//! authentication gate (pending until `authenticate`, settled at most once)
//! and one bounded-concurrency fetcher shared by all operations, and applies
//! the boundary error policy: listing-style operations map a `NotFound`
//! failure to their explicit empty result, since an absent folder or a
//! workflow with no branches yet is "empty", not broken. Every other
//! failure propagates to the caller.

use std::sync::Arc;

use bytes::Bytes;
use verso_client::{
    AuthGate, Context, Fetcher, RequestExecutor, StaticCredentials,
};
use verso_core::{
    CacheStore, ChangeSet, Credentials, Cursor, CursorAction, Entry, Error, MediaAsset,
    MemoryCache, Result, WorkflowStatus,
};

use crate::TRACING_TARGET;
use crate::provider::{EditorialWorkflow, Provider};
use crate::types::{
    CollectionSpec, DeployPreview, FileChange, MediaUpload, Page, PersistOptions,
};

/// Configuration for one backend session.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root URL.
    pub api_root: String,
    /// Repository identifier (`owner/name` or a project id).
    pub repo: String,
    /// Branch to read from and write to.
    pub branch: String,
    /// Media folder path.
    pub media_folder: String,
    /// Enable the editorial (review) workflow.
    pub editorial_workflow: bool,
    /// Route non-maintainer contributions through personal forks. Requires
    /// the editorial workflow.
    pub fork_workflow: bool,
    /// Status context string identifying the deploy preview; the default
    /// keyword set is used when absent.
    pub preview_context: Option<String>,
    /// Ceiling on simultaneous downloads.
    pub max_concurrent: usize,
}

impl BackendConfig {
    /// Creates a configuration with workflow features off.
    pub fn new(api_root: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            repo: repo.into(),
            branch: "master".to_owned(),
            media_folder: "static/media".to_owned(),
            editorial_workflow: false,
            fork_workflow: false,
            preview_context: None,
            max_concurrent: verso_client::DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Sets the branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the media folder.
    #[must_use]
    pub fn with_media_folder(mut self, media_folder: impl Into<String>) -> Self {
        self.media_folder = media_folder.into();
        self
    }

    /// Enables the editorial workflow.
    #[must_use]
    pub fn with_editorial_workflow(mut self) -> Self {
        self.editorial_workflow = true;
        self
    }

    /// Enables the fork workflow.
    #[must_use]
    pub fn with_fork_workflow(mut self) -> Self {
        self.fork_workflow = true;
        self
    }

    /// Sets the deploy-preview status context.
    #[must_use]
    pub fn with_preview_context(mut self, preview_context: impl Into<String>) -> Self {
        self.preview_context = Some(preview_context.into());
        self
    }

    /// Sets the download concurrency ceiling.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }
}

/// Uniform backend over a provider adapter.
pub struct Backend {
    provider: Arc<dyn Provider>,
    config: BackendConfig,
    gate: Arc<AuthGate>,
    fetcher: Fetcher,
    executor: Arc<dyn RequestExecutor>,
    cache: Arc<dyn CacheStore>,
}

impl Backend {
    /// Creates a backend over the given provider.
    ///
    /// Fails with a configuration error when the fork workflow is enabled
    /// without the editorial workflow, or when the editorial workflow is
    /// enabled but the provider lacks the capability.
    pub fn new(
        provider: Arc<dyn Provider>,
        config: BackendConfig,
        executor: Arc<dyn RequestExecutor>,
    ) -> Result<Self> {
        Self::with_cache(provider, config, executor, Arc::new(MemoryCache::new()))
    }

    /// Creates a backend with an explicit content cache.
    pub fn with_cache(
        provider: Arc<dyn Provider>,
        config: BackendConfig,
        executor: Arc<dyn RequestExecutor>,
        cache: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        if config.fork_workflow && !config.editorial_workflow {
            return Err(Error::configuration().with_message(
                "fork workflow requires the editorial workflow to be enabled",
            ));
        }
        if config.editorial_workflow && provider.editorial().is_none() {
            return Err(Error::configuration().with_message(format!(
                "provider {} does not support the editorial workflow",
                provider.name()
            )));
        }

        tracing::info!(
            target: TRACING_TARGET,
            provider = provider.name(),
            repo = %config.repo,
            branch = %config.branch,
            editorial = config.editorial_workflow,
            fork = config.fork_workflow,
            "Backend initialized"
        );

        let fetcher = Fetcher::new(config.max_concurrent);
        Ok(Self {
            provider,
            config,
            gate: Arc::new(AuthGate::new()),
            fetcher,
            executor,
            cache,
        })
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Builds a fresh per-call context carrying the session gate.
    fn context(&self) -> Result<Context> {
        Context::builder(self.provider.name())
            .api_root(&self.config.api_root)
            .repo(&self.config.repo)
            .branch(&self.config.branch)
            .credentials(Arc::clone(&self.gate) as Arc<dyn verso_client::CredentialsSource>)
            .executor(Arc::clone(&self.executor))
            .cache(Arc::clone(&self.cache))
            .build()
    }

    /// Builds a context with a fixed credential source, used while the gate
    /// is still pending.
    fn context_with(&self, credentials: Credentials) -> Result<Context> {
        Ok(self
            .context()?
            .with_credentials(Arc::new(StaticCredentials(credentials))))
    }

    /// Waits for the authentication gate, then builds the per-call context.
    ///
    /// Every operation passes through here, so callers arriving before
    /// authentication completes suspend rather than fail.
    async fn session(&self) -> Result<Context> {
        self.gate.credentials().await?;
        self.context()
    }

    /// Verifies credentials and settles the authentication gate.
    ///
    /// Every other operation suspends on the gate, so callers arriving
    /// before this completes are released together with its outcome. The
    /// gate settles at most once per backend; re-authentication means
    /// building a new backend.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<Credentials> {
        let ctx = self.context_with(credentials.clone())?;
        match self.provider.check_credentials(&ctx, credentials).await {
            Ok(verified) => {
                self.gate.resolve(verified.clone());
                Ok(verified)
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    provider = self.provider.name(),
                    error = %err,
                    "Authentication failed"
                );
                self.gate.reject(&err);
                Err(err)
            }
        }
    }

    /// Lists one page of a collection, with an empty page for an absent
    /// folder.
    pub async fn entries(&self, collection: &CollectionSpec) -> Result<Page> {
        let ctx = self.session().await?;
        match self
            .provider
            .list_entries(&ctx, collection, &self.fetcher)
            .await
        {
            Ok(page) => Ok(page),
            Err(err) if err.is_not_found() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    collection = %collection.name,
                    "Collection source absent, returning empty page"
                );
                Ok(Page::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Lists every entry of a collection.
    pub async fn all_entries(&self, collection: &CollectionSpec) -> Result<Vec<Entry>> {
        let ctx = self.session().await?;
        match self
            .provider
            .list_all_entries(&ctx, collection, &self.fetcher)
            .await
        {
            Ok(entries) => Ok(entries),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Reads a single entry.
    pub async fn entry(&self, path: &str) -> Result<Entry> {
        let ctx = self.session().await?;
        self.provider.get_entry(&ctx, path).await
    }

    /// Lists media assets, with an empty index for an absent media folder.
    pub async fn media(&self) -> Result<Vec<MediaAsset>> {
        let ctx = self.session().await?;
        match self
            .provider
            .media_index(&ctx, &self.config.media_folder)
            .await
        {
            Ok(assets) => Ok(assets),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Fetches one media asset's content.
    pub async fn media_content(&self, asset: &MediaAsset) -> Result<Bytes> {
        let ctx = self.session().await?;
        self.provider.media_content(&ctx, asset).await
    }

    /// Persists one entry as a single commit.
    pub async fn persist_entry(&self, entry: &FileChange, options: &PersistOptions) -> Result<()> {
        let ctx = self.session().await?;
        self.provider.persist_entry(&ctx, entry, options).await
    }

    /// Persists one media file as a single commit.
    pub async fn persist_media(
        &self,
        file: &MediaUpload,
        options: &PersistOptions,
    ) -> Result<MediaAsset> {
        let ctx = self.session().await?;
        self.provider.persist_media(&ctx, file, options).await
    }

    /// Deletes a file as a single commit.
    pub async fn delete_file(&self, path: &str, commit_message: &str) -> Result<()> {
        let ctx = self.session().await?;
        self.provider
            .delete_file(&ctx, path, commit_message, None)
            .await
    }

    /// Follows a cursor in the given direction.
    pub async fn traverse_cursor(&self, cursor: &Cursor, action: CursorAction) -> Result<Page> {
        let ctx = self.session().await?;
        self.provider
            .traverse_cursor(&ctx, cursor, action, &self.fetcher)
            .await
    }

    fn editorial(&self) -> Result<&dyn EditorialWorkflow> {
        self.provider.editorial().ok_or_else(|| {
            Error::unsupported().with_message(format!(
                "provider {} does not support the editorial workflow",
                self.provider.name()
            ))
        })
    }

    /// Discovers all unpublished change sets.
    ///
    /// An unsupported capability or an absent branch namespace both mean
    /// "no unpublished entries"; any other failure propagates.
    pub async fn unpublished_entries(&self) -> Result<Vec<ChangeSet>> {
        let editorial = match self.editorial() {
            Ok(editorial) => editorial,
            Err(_) => return Ok(Vec::new()),
        };
        let ctx = self.session().await?;
        match editorial.unpublished_entries(&ctx, &self.fetcher).await {
            Ok(entries) => Ok(entries),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Resolves one unpublished change set.
    pub async fn unpublished_entry(
        &self,
        collection: &str,
        slug: &str,
    ) -> Result<Option<ChangeSet>> {
        let ctx = self.session().await?;
        self.editorial()?
            .unpublished_entry(&ctx, collection, slug)
            .await
    }

    /// Moves an unpublished change set to a new status.
    pub async fn update_unpublished_status(
        &self,
        collection: &str,
        slug: &str,
        status: WorkflowStatus,
    ) -> Result<()> {
        let ctx = self.session().await?;
        self.editorial()?
            .update_status(&ctx, collection, slug, status)
            .await
    }

    /// Publishes an unpublished change set.
    pub async fn publish_unpublished_entry(&self, collection: &str, slug: &str) -> Result<()> {
        let ctx = self.session().await?;
        self.editorial()?.publish_entry(&ctx, collection, slug).await
    }

    /// Discards an unpublished change set.
    pub async fn delete_unpublished_entry(&self, collection: &str, slug: &str) -> Result<()> {
        let ctx = self.session().await?;
        self.editorial()?.delete_entry(&ctx, collection, slug).await
    }

    /// Infers a deploy preview for an unpublished change set.
    pub async fn deploy_preview(
        &self,
        collection: &str,
        slug: &str,
    ) -> Result<Option<DeployPreview>> {
        let ctx = self.session().await?;
        self.editorial()?
            .deploy_preview(&ctx, collection, slug, self.config.preview_context.as_deref())
            .await
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("provider", &self.provider.name())
            .field("repo", &self.config.repo)
            .field("branch", &self.config.branch)
            .finish_non_exhaustive()
    }
}
