//! GitHub editorial workflow backed by `cms/` branches.
//!
//! Each unpublished change set lives on a branch named after its content
//! key. A JSON metadata document on a dedicated bookkeeping branch records
//! the review status and the linked pull request; the branch list alone
//! drives discovery, so nothing is queued locally.

use async_trait::async_trait;
use verso_backend::{DeployPreview, EditorialWorkflow, PersistOptions};
use verso_client::{Context, Fetcher};
use verso_core::{
    BRANCH_PREFIX, ChangeSet, ChangeSetMetadata, Error, Result, WorkflowStatus, branch_name,
    content_key, content_key_from_ref, slug_from_content_key,
};

use crate::{TRACING_TARGET, api};

/// Branch carrying the change-set metadata documents.
const META_BRANCH: &str = "_verso_meta";

/// Default commit-status keyword marking a deploy preview.
const PREVIEW_KEYWORD: &str = "deploy";

pub(crate) struct GithubEditorial {
    squash_merges: bool,
}

impl GithubEditorial {
    pub(crate) fn new(squash_merges: bool) -> Self {
        Self { squash_merges }
    }

    fn meta_path(key: &str) -> String {
        format!("{key}.json")
    }

    async fn read_metadata(&self, ctx: &Context, key: &str) -> Result<Option<ChangeSetMetadata>> {
        let meta_ctx = ctx.with_branch(META_BRANCH);
        match api::read_file_text(&meta_ctx, &Self::meta_path(key), None).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write_metadata(
        &self,
        ctx: &Context,
        key: &str,
        metadata: &ChangeSetMetadata,
    ) -> Result<()> {
        let meta_ctx = ctx.with_branch(META_BRANCH);
        let options = PersistOptions::update(format!("Update change metadata for {key}"))
            .with_branch(META_BRANCH);
        let body = serde_json::to_vec(metadata)?;
        api::persist_file(&meta_ctx, &Self::meta_path(key), &body, &options).await?;
        Ok(())
    }

    async fn delete_metadata(&self, ctx: &Context, key: &str) -> Result<()> {
        let meta_ctx = ctx.with_branch(META_BRANCH);
        let message = format!("Remove change metadata for {key}");
        match api::delete_file(&meta_ctx, &Self::meta_path(key), &message, Some(META_BRANCH)).await
        {
            Ok(()) => Ok(()),
            // A change set may predate its metadata document.
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Resolves one change set by content key: metadata, branch-tip content,
    /// and whether the target file already exists on the main branch.
    async fn resolve(&self, ctx: &Context, key: &str) -> Result<Option<ChangeSet>> {
        let Some(metadata) = self.read_metadata(ctx, key).await? else {
            return Ok(None);
        };

        let branch_ctx = ctx.with_branch(branch_name(key));
        let data = api::read_file_text(&branch_ctx, &metadata.path, None).await?;
        let is_modification = api::file_sha(ctx, &metadata.path, ctx.branch())
            .await?
            .is_some();

        Ok(Some(ChangeSet {
            slug: slug_from_content_key(key).to_owned(),
            content_key: key.to_owned(),
            metadata,
            data,
            is_modification,
        }))
    }
}

#[async_trait]
impl EditorialWorkflow for GithubEditorial {
    async fn unpublished_entries(
        &self,
        ctx: &Context,
        fetcher: &Fetcher,
    ) -> Result<Vec<ChangeSet>> {
        let refs = api::list_refs(ctx, &format!("{BRANCH_PREFIX}/")).await?;
        let keys: Vec<String> = refs
            .iter()
            .filter_map(|r| content_key_from_ref(&r.git_ref))
            .map(str::to_owned)
            .collect();
        tracing::debug!(
            target: TRACING_TARGET,
            count = keys.len(),
            "Discovered unpublished change branches"
        );

        let resolved = fetcher
            .fetch_all(keys, |key| async move {
                self.resolve(ctx, &key).await?.ok_or_else(|| {
                    Error::not_found().with_message(format!("no metadata for change {key}"))
                })
            })
            .await;

        let mut entries: Vec<ChangeSet> = resolved.into_iter().map(|(_, entry)| entry).collect();
        entries.sort_by(|a, b| a.content_key.cmp(&b.content_key));
        Ok(entries)
    }

    async fn unpublished_entry(
        &self,
        ctx: &Context,
        collection: &str,
        slug: &str,
    ) -> Result<Option<ChangeSet>> {
        self.resolve(ctx, &content_key(collection, slug)).await
    }

    async fn update_status(
        &self,
        ctx: &Context,
        collection: &str,
        slug: &str,
        status: WorkflowStatus,
    ) -> Result<()> {
        let key = content_key(collection, slug);
        let mut metadata = self.read_metadata(ctx, &key).await?.ok_or_else(|| {
            Error::not_found().with_message(format!("no unpublished change for {key}"))
        })?;
        metadata.status = status;
        self.write_metadata(ctx, &key, &metadata).await
    }

    async fn publish_entry(&self, ctx: &Context, collection: &str, slug: &str) -> Result<()> {
        let key = content_key(collection, slug);
        let metadata = self.read_metadata(ctx, &key).await?.ok_or_else(|| {
            Error::not_found().with_message(format!("no unpublished change for {key}"))
        })?;
        let review = metadata.review.ok_or_else(|| {
            Error::external().with_message(format!("change {key} has no linked review"))
        })?;

        api::merge_pull(ctx, review.number, self.squash_merges).await?;
        api::delete_branch(ctx, &branch_name(&key)).await?;
        self.delete_metadata(ctx, &key).await?;
        tracing::debug!(target: TRACING_TARGET, key = %key, "Published change set");
        Ok(())
    }

    async fn delete_entry(&self, ctx: &Context, collection: &str, slug: &str) -> Result<()> {
        let key = content_key(collection, slug);
        api::delete_branch(ctx, &branch_name(&key)).await?;
        self.delete_metadata(ctx, &key).await?;
        tracing::debug!(target: TRACING_TARGET, key = %key, "Discarded change set");
        Ok(())
    }

    async fn deploy_preview(
        &self,
        ctx: &Context,
        collection: &str,
        slug: &str,
        preview_context: Option<&str>,
    ) -> Result<Option<DeployPreview>> {
        let key = content_key(collection, slug);
        let Some(metadata) = self.read_metadata(ctx, &key).await? else {
            return Ok(None);
        };
        let Some(review) = metadata.review else {
            return Ok(None);
        };

        let statuses = api::statuses(ctx, &review.head).await?;
        let preview = statuses.into_iter().find(|status| {
            match preview_context {
                Some(wanted) => status.context.eq_ignore_ascii_case(wanted),
                None => status.context.to_ascii_lowercase().contains(PREVIEW_KEYWORD),
            }
        });

        Ok(preview.and_then(|status| {
            status.target_url.map(|url| DeployPreview {
                url,
                status: status.state,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::testing::{ScriptedExecutor, context, json_response};

    fn metadata_doc(status: &str, review: bool) -> serde_json::Value {
        let mut doc = json!({
            "collection": "posts",
            "path": "content/posts/hello.md",
            "status": status,
        });
        if review {
            doc["review"] = json!({ "number": 7, "head": "headsha" });
        }
        doc
    }

    fn content_response(text: &str) -> serde_json::Value {
        use base64::Engine as _;
        json!({
            "sha": "filesha",
            "content": base64::engine::general_purpose::STANDARD.encode(text),
            "encoding": "base64",
        })
    }

    #[tokio::test]
    async fn test_unpublished_entry_resolves_content_and_modification_flag() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/hello.json",
            json_response(200, content_response(&metadata_doc("draft", true).to_string())),
        );
        executor.on(
            "GET",
            "/repos/org/site/contents/content/posts/hello.md",
            json_response(200, content_response("# Hello")),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let editorial = GithubEditorial::new(false);
        let entry = editorial
            .unpublished_entry(&ctx, "posts", "hello")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.slug, "hello");
        assert_eq!(entry.content_key, "posts/hello");
        assert_eq!(entry.data, "# Hello");
        assert_eq!(entry.metadata.status, WorkflowStatus::Draft);
        // The same contents route answered both the branch read and the
        // main-branch probe, so the file counts as already published.
        assert!(entry.is_modification);
    }

    #[tokio::test]
    async fn test_missing_metadata_resolves_to_none() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/hello.json",
            json_response(404, json!({ "message": "Not Found" })),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let editorial = GithubEditorial::new(false);
        let entry = editorial
            .unpublished_entry(&ctx, "posts", "hello")
            .await
            .unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_discovery_skips_foreign_refs_and_failed_branches() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/git/refs/heads/cms/",
            json_response(
                200,
                json!([
                    { "ref": "refs/heads/cms/posts/good", "object": { "sha": "a" } },
                    { "ref": "refs/heads/cms/posts/broken", "object": { "sha": "b" } },
                ]),
            ),
        );
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/good.json",
            json_response(200, content_response(&metadata_doc("pending_review", false).to_string())),
        );
        executor.on(
            "GET",
            "/repos/org/site/contents/content/posts/hello.md",
            json_response(200, content_response("body")),
        );
        // The broken branch lost its metadata document.
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/broken.json",
            json_response(404, json!({})),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let editorial = GithubEditorial::new(false);
        let entries = editorial
            .unpublished_entries(&ctx, &Fetcher::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content_key, "posts/good");
        assert_eq!(entries[0].metadata.status, WorkflowStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_publish_merges_review_and_cleans_up() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/hello.json",
            json_response(200, content_response(&metadata_doc("pending_publish", true).to_string())),
        );
        executor.on("PUT", "/repos/org/site/pulls/7/merge", json_response(200, json!({ "merged": true })));
        executor.on(
            "DELETE",
            "/repos/org/site/git/refs/heads/cms/posts/hello",
            json_response(204, json!(null)),
        );
        executor.on(
            "DELETE",
            "/repos/org/site/contents/posts/hello.json",
            json_response(200, json!({ "commit": { "sha": "c" } })),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let editorial = GithubEditorial::new(false);
        editorial.publish_entry(&ctx, "posts", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_without_review_fails() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/hello.json",
            json_response(200, content_response(&metadata_doc("pending_publish", false).to_string())),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let editorial = GithubEditorial::new(false);
        let err = editorial
            .publish_entry(&ctx, "posts", "hello")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), verso_core::ErrorKind::ExternalError);
    }

    #[tokio::test]
    async fn test_deploy_preview_matches_keyword_context() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/contents/posts/hello.json",
            json_response(200, content_response(&metadata_doc("pending_review", true).to_string())),
        );
        executor.on(
            "GET",
            "/repos/org/site/commits/headsha/statuses",
            json_response(
                200,
                json!([
                    { "state": "pending", "context": "ci/tests", "target_url": "https://ci.test/1" },
                    { "state": "success", "context": "pages/deploy-preview", "target_url": "https://preview.test" },
                ]),
            ),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let editorial = GithubEditorial::new(false);
        let preview = editorial
            .deploy_preview(&ctx, "posts", "hello", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(preview.url, "https://preview.test");
        assert_eq!(preview.status, "success");
    }
}
