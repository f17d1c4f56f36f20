//! The GitLab provider adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use verso_backend::{
    CollectionSource, CollectionSpec, FileChange, MediaUpload, Page, PersistOptions, Provider,
};
use verso_client::{Context, Fetcher};
use verso_core::{
    Credentials, Cursor, CursorAction, Entry, Error, FileData, FileRef, MediaAsset, Result,
};

use crate::config::GitlabConfig;
use crate::{TRACING_TARGET, WRITE_ACCESS, api, wire};

/// Entries per page when walking a complete folder.
const FULL_LISTING_PAGE_SIZE: u64 = 100;

/// Git-hosting adapter for the GitLab v4 REST API.
///
/// Folder listings are presented newest-first: the tree API pages
/// oldest-first, so the adapter jumps to the last page, reverses its
/// entries, and hands out a mirrored cursor. Traversal re-applies the same
/// mirroring so the caller only ever sees the newest-first view.
#[derive(Debug)]
pub struct GitlabProvider {
    config: GitlabConfig,
}

impl GitlabProvider {
    pub fn new(config: GitlabConfig) -> Self {
        Self { config }
    }

    fn to_file_refs(items: Vec<wire::TreeItem>, extension: Option<&str>) -> Vec<FileRef> {
        items
            .into_iter()
            .map(|item| FileRef::new(item.path).with_id(item.id))
            .filter(|file| extension.is_none_or(|ext| file.extension() == Some(ext)))
            .collect()
    }

    /// Fetches content for the given files, preserving their order.
    ///
    /// `fetch_all` completes in arbitrary order and drops failures, so the
    /// results are re-associated by path against the input sequence.
    async fn fetch_entries(
        &self,
        ctx: &Context,
        files: Vec<FileRef>,
        fetcher: &Fetcher,
    ) -> Vec<Entry> {
        let mut fetched: HashMap<String, String> = fetcher
            .fetch_all(files.clone(), |file| async move {
                api::read_file_text(ctx, &file.path, file.id.as_deref()).await
            })
            .await
            .into_iter()
            .map(|(file, text)| (file.path, text))
            .collect();

        files
            .into_iter()
            .filter_map(|file| {
                fetched
                    .remove(&file.path)
                    .map(|text| Entry::new(file, FileData::Text(text)))
            })
            .collect()
    }

    /// Stamps the collection's extension filter into the cursor payload and
    /// mirrors it for the newest-first view.
    fn outgoing_cursor(mut cursor: Cursor, extension: Option<&str>) -> Cursor {
        if let (Some(ext), Value::Object(data)) = (extension, &mut cursor.data) {
            data.insert("extension".to_owned(), Value::String(ext.to_owned()));
        }
        cursor.reversed()
    }

    /// Walks every page of a folder via `next` links.
    async fn list_folder_all(&self, ctx: &Context, folder: &str) -> Result<Vec<wire::TreeItem>> {
        let mut page = api::tree_page(ctx, folder, FULL_LISTING_PAGE_SIZE).await?;
        let mut items = std::mem::take(&mut page.items);
        while let Some(cursor) = page.cursor.take() {
            if !cursor.has_action(CursorAction::Next) {
                break;
            }
            let url = cursor.link(CursorAction::Next)?.to_owned();
            page = api::tree_page_at(ctx, &url).await?;
            items.append(&mut page.items);
        }
        Ok(items)
    }
}

#[async_trait]
impl Provider for GitlabProvider {
    fn name(&self) -> &str {
        "gitlab"
    }

    async fn check_credentials(
        &self,
        ctx: &Context,
        credentials: Credentials,
    ) -> Result<Credentials> {
        let user = api::user(ctx).await?;

        let project = api::project(ctx).await?;
        let permissions = project.permissions.unwrap_or_default();
        let writable = [&permissions.project_access, &permissions.group_access]
            .into_iter()
            .flatten()
            .any(|access| access.access_level >= WRITE_ACCESS);
        if !writable {
            return Err(Error::authorization().with_message(format!(
                "{} has no write access to {}",
                user.username, self.config.repo
            )));
        }

        let mut credentials = credentials.with_login(&user.username);
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
        let (folder, extension) = match &collection.source {
            CollectionSource::Folder { path, extension } => (path, extension),
            CollectionSource::Files { files } => {
                let entries = self.fetch_entries(ctx, files.clone(), fetcher).await;
                return Ok(Page {
                    entries,
                    cursor: None,
                });
            }
        };

        // Probe the paging headers first; when more than one page exists
        // the listing starts from the last (newest) page.
        let probe = api::tree_cursor(ctx, folder, self.config.page_size).await?;
        let page = match &probe {
            Some(cursor) if cursor.has_action(CursorAction::Last) => {
                let url = cursor.link(CursorAction::Last)?.to_owned();
                api::tree_page_at(ctx, &url).await?
            }
            _ => api::tree_page(ctx, folder, self.config.page_size).await?,
        };
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %collection.name,
            files = page.items.len(),
            "Fetching last listing page newest-first"
        );

        let mut items = page.items;
        items.reverse();
        let files = Self::to_file_refs(items, Some(extension));
        let entries = self.fetch_entries(ctx, files, fetcher).await;

        Ok(Page {
            entries,
            cursor: page
                .cursor
                .map(|cursor| Self::outgoing_cursor(cursor, Some(extension))),
        })
    }

    async fn list_all_entries(
        &self,
        ctx: &Context,
        collection: &CollectionSpec,
        fetcher: &Fetcher,
    ) -> Result<Vec<Entry>> {
        let files = match &collection.source {
            CollectionSource::Folder { path, extension } => {
                Self::to_file_refs(self.list_folder_all(ctx, path).await?, Some(extension))
            }
            CollectionSource::Files { files } => files.clone(),
        };
        Ok(self.fetch_entries(ctx, files, fetcher).await)
    }

    async fn get_entry(&self, ctx: &Context, path: &str) -> Result<Entry> {
        let text = api::read_file_text(ctx, path, None).await?;
        Ok(Entry::new(FileRef::new(path), FileData::Text(text)))
    }

    async fn media_index(&self, ctx: &Context, media_folder: &str) -> Result<Vec<MediaAsset>> {
        let items = self.list_folder_all(ctx, media_folder).await?;
        Ok(items
            .into_iter()
            .map(|item| MediaAsset {
                id: item.id,
                name: item.name,
                path: item.path,
                size: None,
            })
            .collect())
    }

    async fn media_content(&self, ctx: &Context, asset: &MediaAsset) -> Result<Bytes> {
        api::read_file_blob(ctx, &asset.path, Some(&asset.id)).await
    }

    async fn persist_entry(
        &self,
        ctx: &Context,
        entry: &FileChange,
        options: &PersistOptions,
    ) -> Result<()> {
        api::persist_file(ctx, &entry.path, entry.content.as_bytes(), options).await
    }

    async fn persist_media(
        &self,
        ctx: &Context,
        file: &MediaUpload,
        options: &PersistOptions,
    ) -> Result<MediaAsset> {
        api::persist_file(ctx, &file.path, &file.content, options).await?;
        // The commits API does not echo blob ids; the path stands in until
        // the next media listing replaces it with the tree id.
        Ok(MediaAsset {
            id: file.path.clone(),
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
        api::delete_file(ctx, path, commit_message, branch).await
    }

    async fn traverse_cursor(
        &self,
        ctx: &Context,
        cursor: &Cursor,
        action: CursorAction,
        fetcher: &Fetcher,
    ) -> Result<Page> {
        if !cursor.has_action(action) {
            return Err(Error::cursor_validation().with_message(format!(
                "action {} is not valid from this page",
                action.as_ref()
            )));
        }

        let url = cursor.link(action)?.to_owned();
        let page = api::tree_page_at(ctx, &url).await?;

        let extension = cursor
            .data
            .get("extension")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let mut items = page.items;
        items.reverse();
        let files = Self::to_file_refs(items, extension.as_deref());
        let entries = self.fetch_entries(ctx, files, fetcher).await;

        Ok(Page {
            entries,
            cursor: page
                .cursor
                .map(|cursor| Self::outgoing_cursor(cursor, extension.as_deref())),
        })
    }
}
