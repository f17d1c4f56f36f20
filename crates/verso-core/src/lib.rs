#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod cache;
mod credentials;
mod cursor;
mod editorial;
mod entry;
mod error;

pub use cache::{CacheStore, MemoryCache, cache_key};
pub use credentials::Credentials;
pub use cursor::{Cursor, CursorAction, CursorMeta, PageInfo};
pub use editorial::{
    BRANCH_PREFIX, ChangeSet, ChangeSetMetadata, ReviewRef, WorkflowStatus, branch_name,
    content_key, content_key_from_ref, slug_from_content_key,
};
pub use entry::{Entry, FileData, FileRef, MediaAsset};
pub use error::{BoxedError, Error, ErrorKind, Result};
