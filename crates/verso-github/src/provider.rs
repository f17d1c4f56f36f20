//! The GitHub provider adapter.

use async_trait::async_trait;
use bytes::Bytes;
use verso_backend::{
    CollectionSource, CollectionSpec, EditorialWorkflow, FileChange, MediaUpload, Page,
    PersistOptions, Provider,
};
use verso_client::{Context, Fetcher};
use verso_core::{
    Credentials, Cursor, CursorAction, Entry, Error, FileData, FileRef, MediaAsset, Result,
};

use crate::config::GithubConfig;
use crate::editorial::GithubEditorial;
use crate::fork::ForkWorkflow;
use crate::{TRACING_TARGET, api};

/// Git-hosting adapter for the GitHub REST API.
///
/// Folder listings come from the contents API, which returns a whole folder
/// in one response; pages therefore never carry a cursor.
pub struct GithubProvider {
    config: GithubConfig,
    fork: Option<ForkWorkflow>,
    editorial: Option<GithubEditorial>,
}

impl GithubProvider {
    /// Creates the adapter, validating the workflow flags.
    ///
    /// Fork-based contributions land on `cms/` branches of the fork, so the
    /// fork workflow is unusable without the editorial workflow. Rejecting
    /// the combination here keeps the invariant independent of how the
    /// wrapper was configured.
    pub fn new(config: GithubConfig) -> Result<Self> {
        if config.fork_workflow && !config.editorial_workflow {
            return Err(Error::configuration().with_message(
                "fork workflow requires the editorial workflow to be enabled",
            ));
        }
        let fork = config
            .fork_workflow
            .then(|| ForkWorkflow::new(&config.repo));
        let editorial = config
            .editorial_workflow
            .then(|| GithubEditorial::new(config.squash_merges));
        Ok(Self {
            config,
            fork,
            editorial,
        })
    }

    /// Context for write operations: the user's fork when the fork workflow
    /// resolved one, the origin otherwise.
    fn write_ctx(&self, ctx: &Context) -> Context {
        match self.fork.as_ref().and_then(ForkWorkflow::operating_repo) {
            Some(repo) if repo != ctx.repo() => ctx.with_repo(repo),
            _ => ctx.clone(),
        }
    }

    fn collection_files(extension: &str, listed: Vec<crate::wire::ContentItem>) -> Vec<FileRef> {
        listed
            .into_iter()
            .map(|item| FileRef::new(item.path).with_id(item.sha))
            .filter(|file| file.extension() == Some(extension))
            .collect()
    }

    async fn fetch_entries(
        &self,
        ctx: &Context,
        files: Vec<FileRef>,
        fetcher: &Fetcher,
    ) -> Vec<Entry> {
        let fetched = fetcher
            .fetch_all(files, |file| async move {
                api::read_file_text(ctx, &file.path, file.id.as_deref()).await
            })
            .await;

        let mut entries: Vec<Entry> = fetched
            .into_iter()
            .map(|(file, text)| Entry::new(file, FileData::Text(text)))
            .collect();
        entries.sort_by(|a, b| a.file.path.cmp(&b.file.path));
        entries
    }

    async fn list_collection(
        &self,
        ctx: &Context,
        collection: &CollectionSpec,
        fetcher: &Fetcher,
    ) -> Result<Vec<Entry>> {
        let files = match &collection.source {
            CollectionSource::Folder { path, extension } => {
                Self::collection_files(extension, api::list_files(ctx, path).await?)
            }
            CollectionSource::Files { files } => files.clone(),
        };
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %collection.name,
            files = files.len(),
            "Fetching collection entries"
        );
        Ok(self.fetch_entries(ctx, files, fetcher).await)
    }
}

#[async_trait]
impl Provider for GithubProvider {
    fn name(&self) -> &str {
        "github"
    }

    async fn check_credentials(
        &self,
        ctx: &Context,
        credentials: Credentials,
    ) -> Result<Credentials> {
        let user = api::user(ctx).await?;

        if let Some(fork) = &self.fork {
            fork.authorize(ctx, &user.login).await?;
        } else {
            let repo = api::repo(ctx).await?;
            let writable = repo
                .permissions
                .is_some_and(|p| p.push || p.admin);
            if !writable {
                return Err(Error::authorization().with_message(format!(
                    "{} has no write access to {}",
                    user.login, self.config.repo
                )));
            }
        }

        let mut credentials = credentials.with_login(&user.login);
        if let Some(name) = user.name {
            credentials = credentials.with_name(name);
        }
        Ok(credentials)
    }

    async fn list_entries(
        &self,
        ctx: &Context,
        collection: &CollectionSpec,
        fetcher: &Fetcher,
    ) -> Result<Page> {
        let entries = self.list_collection(ctx, collection, fetcher).await?;
        Ok(Page {
            entries,
            cursor: None,
        })
    }

    async fn list_all_entries(
        &self,
        ctx: &Context,
        collection: &CollectionSpec,
        fetcher: &Fetcher,
    ) -> Result<Vec<Entry>> {
        self.list_collection(ctx, collection, fetcher).await
    }

    async fn get_entry(&self, ctx: &Context, path: &str) -> Result<Entry> {
        let text = api::read_file_text(ctx, path, None).await?;
        Ok(Entry::new(FileRef::new(path), FileData::Text(text)))
    }

    async fn media_index(&self, ctx: &Context, media_folder: &str) -> Result<Vec<MediaAsset>> {
        let items = api::list_files(ctx, media_folder).await?;
        Ok(items
            .into_iter()
            .map(|item| MediaAsset {
                id: item.sha,
                name: item.name,
                path: item.path,
                size: item.size,
            })
            .collect())
    }

    async fn media_content(&self, ctx: &Context, asset: &MediaAsset) -> Result<Bytes> {
        api::read_file(ctx, &asset.path, Some(&asset.id)).await
    }

    async fn persist_entry(
        &self,
        ctx: &Context,
        entry: &FileChange,
        options: &PersistOptions,
    ) -> Result<()> {
        let ctx = self.write_ctx(ctx);
        api::persist_file(&ctx, &entry.path, entry.content.as_bytes(), options).await?;
        Ok(())
    }

    async fn persist_media(
        &self,
        ctx: &Context,
        file: &MediaUpload,
        options: &PersistOptions,
    ) -> Result<MediaAsset> {
        let ctx = self.write_ctx(ctx);
        let sha = api::persist_file(&ctx, &file.path, &file.content, options)
            .await?
            .ok_or_else(|| {
                Error::external().with_message("provider reported no blob for uploaded media")
            })?;
        Ok(MediaAsset {
            id: sha,
            name: file.name.clone(),
            path: file.path.clone(),
            size: Some(file.content.len() as u64),
        })
    }

    async fn delete_file(
        &self,
        ctx: &Context,
        path: &str,
        commit_message: &str,
        branch: Option<&str>,
    ) -> Result<()> {
        let ctx = self.write_ctx(ctx);
        api::delete_file(&ctx, path, commit_message, branch).await
    }

    async fn traverse_cursor(
        &self,
        _ctx: &Context,
        _cursor: &Cursor,
        _action: CursorAction,
        _fetcher: &Fetcher,
    ) -> Result<Page> {
        Err(Error::unsupported().with_message("folder listings are not paginated"))
    }

    fn editorial(&self) -> Option<&dyn EditorialWorkflow> {
        self.editorial
            .as_ref()
            .map(|editorial| editorial as &dyn EditorialWorkflow)
    }
}

impl std::fmt::Debug for GithubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubProvider")
            .field("repo", &self.config.repo)
            .field("fork_workflow", &self.fork.is_some())
            .field("editorial_workflow", &self.editorial.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::Engine as _;
    use serde_json::json;

    use super::*;
    use crate::testing::{ScriptedExecutor, context, json_response};

    fn content_item(path: &str, sha: &str) -> serde_json::Value {
        let name = path.rsplit('/').next().unwrap();
        json!({ "name": name, "path": path, "sha": sha, "size": 10, "type": "file" })
    }

    fn content_file(text: &str) -> serde_json::Value {
        json!({
            "sha": "filesha",
            "content": base64::engine::general_purpose::STANDARD.encode(text),
            "encoding": "base64",
        })
    }

    #[test]
    fn test_fork_without_editorial_is_rejected_at_construction() {
        let err = GithubProvider::new(GithubConfig::new("org/site").with_fork_workflow())
            .unwrap_err();
        assert_eq!(err.kind(), verso_core::ErrorKind::Configuration);

        let provider = GithubProvider::new(
            GithubConfig::new("org/site")
                .with_fork_workflow()
                .with_editorial_workflow(),
        )
        .unwrap();
        assert!(provider.editorial().is_some());
    }

    #[tokio::test]
    async fn test_check_credentials_requires_push_permission() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/user",
            json_response(200, json!({ "login": "tester", "name": "Test Er" })),
        );
        executor.on(
            "GET",
            "/repos/org/site",
            json_response(
                200,
                json!({ "full_name": "org/site", "permissions": { "push": false, "admin": false } }),
            ),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let provider = GithubProvider::new(GithubConfig::new("org/site")).unwrap();
        let err = provider
            .check_credentials(&ctx, Credentials::new("tok"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), verso_core::ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_check_credentials_enriches_identity() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/user",
            json_response(200, json!({ "login": "tester", "name": "Test Er" })),
        );
        executor.on(
            "GET",
            "/repos/org/site",
            json_response(
                200,
                json!({ "full_name": "org/site", "permissions": { "push": true, "admin": false } }),
            ),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let provider = GithubProvider::new(GithubConfig::new("org/site")).unwrap();
        let credentials = provider
            .check_credentials(&ctx, Credentials::new("tok"))
            .await
            .unwrap();
        assert_eq!(credentials.login.as_deref(), Some("tester"));
        assert_eq!(credentials.name.as_deref(), Some("Test Er"));
    }

    #[tokio::test]
    async fn test_list_entries_filters_extension_and_sorts() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/content/posts",
            json_response(
                200,
                json!([
                    content_item("content/posts/b.md", "sha-b"),
                    content_item("content/posts/a.md", "sha-a"),
                    content_item("content/posts/image.png", "sha-img"),
                ]),
            ),
        );
        executor.on(
            "GET",
            "/repos/org/site/contents/content/posts/a.md",
            json_response(200, content_file("# A")),
        );
        executor.on(
            "GET",
            "/repos/org/site/contents/content/posts/b.md",
            json_response(200, content_file("# B")),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let provider = GithubProvider::new(GithubConfig::new("org/site")).unwrap();
        let page = provider
            .list_entries(
                &ctx,
                &CollectionSpec::folder("posts", "content/posts"),
                &Fetcher::default(),
            )
            .await
            .unwrap();

        assert!(page.cursor.is_none());
        let paths: Vec<&str> = page
            .entries
            .iter()
            .map(|entry| entry.file.path.as_str())
            .collect();
        assert_eq!(paths, ["content/posts/a.md", "content/posts/b.md"]);
        assert_eq!(page.entries[0].data.as_text(), Some("# A"));
    }

    #[tokio::test]
    async fn test_media_index_lists_without_downloading() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/static/media",
            json_response(200, json!([content_item("static/media/logo.png", "sha-logo")])),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let provider = GithubProvider::new(GithubConfig::new("org/site")).unwrap();
        let assets = provider.media_index(&ctx, "static/media").await.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "sha-logo");
        assert_eq!(assets[0].name, "logo.png");
    }

    #[tokio::test]
    async fn test_traverse_cursor_is_unsupported() {
        let executor = Arc::new(ScriptedExecutor::new());
        let ctx = context(executor, "org/site");

        let provider = GithubProvider::new(GithubConfig::new("org/site")).unwrap();
        let err = provider
            .traverse_cursor(&ctx, &Cursor::new([]), CursorAction::Next, &Fetcher::default())
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
    }
}
