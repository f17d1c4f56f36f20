//! Provider capability traits.
//!
//! A provider is a value implementing a fixed operation set over the request
//! pipeline. The required operations cover listing, reading, writing, and
//! pagination; the editorial workflow is an optional capability surfaced
//! through [`Provider::editorial`], so callers branch on capability presence
//! once at construction instead of probing individual operations at call
//! time.

use bytes::Bytes;
use verso_client::{Context, Fetcher};
use verso_core::{
    ChangeSet, Credentials, Cursor, CursorAction, Entry, MediaAsset, Result, WorkflowStatus,
};

use crate::types::{
    CollectionSpec, DeployPreview, FileChange, MediaUpload, Page, PersistOptions,
};

/// Fixed capability set every provider adapter implements.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, used as the cache namespace.
    fn name(&self) -> &str;

    /// Verifies that the credentials grant write access, returning the
    /// (possibly enriched) session credentials.
    async fn check_credentials(&self, ctx: &Context, credentials: Credentials)
    -> Result<Credentials>;

    /// Lists one page of a collection's entries with their content.
    async fn list_entries(
        &self,
        ctx: &Context,
        collection: &CollectionSpec,
        fetcher: &Fetcher,
    ) -> Result<Page>;

    /// Lists every entry of a collection, paginating internally.
    async fn list_all_entries(
        &self,
        ctx: &Context,
        collection: &CollectionSpec,
        fetcher: &Fetcher,
    ) -> Result<Vec<Entry>>;

    /// Reads a single entry.
    async fn get_entry(&self, ctx: &Context, path: &str) -> Result<Entry>;

    /// Lists media assets without downloading their content.
    async fn media_index(&self, ctx: &Context, media_folder: &str) -> Result<Vec<MediaAsset>>;

    /// Fetches one media asset's content on demand.
    async fn media_content(&self, ctx: &Context, asset: &MediaAsset) -> Result<Bytes>;

    /// Writes one entry as a single commit.
    async fn persist_entry(
        &self,
        ctx: &Context,
        entry: &FileChange,
        options: &PersistOptions,
    ) -> Result<()>;

    /// Writes one media file as a single commit, returning its asset entry.
    async fn persist_media(
        &self,
        ctx: &Context,
        file: &MediaUpload,
        options: &PersistOptions,
    ) -> Result<MediaAsset>;

    /// Deletes a file as a single commit.
    async fn delete_file(
        &self,
        ctx: &Context,
        path: &str,
        commit_message: &str,
        branch: Option<&str>,
    ) -> Result<()>;

    /// Follows a cursor in the given direction and returns the next page.
    async fn traverse_cursor(
        &self,
        ctx: &Context,
        cursor: &Cursor,
        action: CursorAction,
        fetcher: &Fetcher,
    ) -> Result<Page>;

    /// Optional editorial workflow capability.
    fn editorial(&self) -> Option<&dyn EditorialWorkflow> {
        None
    }
}

/// Optional unpublished change-set operations.
#[async_trait::async_trait]
pub trait EditorialWorkflow: Send + Sync {
    /// Discovers all unpublished change sets from provider branches.
    async fn unpublished_entries(&self, ctx: &Context, fetcher: &Fetcher)
    -> Result<Vec<ChangeSet>>;

    /// Resolves a single unpublished change set, if its branch exists.
    async fn unpublished_entry(
        &self,
        ctx: &Context,
        collection: &str,
        slug: &str,
    ) -> Result<Option<ChangeSet>>;

    /// Moves a change set to a new review status.
    async fn update_status(
        &self,
        ctx: &Context,
        collection: &str,
        slug: &str,
        status: WorkflowStatus,
    ) -> Result<()>;

    /// Publishes a change set: merges the linked review and removes the
    /// branch.
    async fn publish_entry(&self, ctx: &Context, collection: &str, slug: &str) -> Result<()>;

    /// Discards a change set.
    async fn delete_entry(&self, ctx: &Context, collection: &str, slug: &str) -> Result<()>;

    /// Infers a deploy preview from the change's commit statuses.
    async fn deploy_preview(
        &self,
        ctx: &Context,
        collection: &str,
        slug: &str,
        preview_context: Option<&str>,
    ) -> Result<Option<DeployPreview>>;
}
