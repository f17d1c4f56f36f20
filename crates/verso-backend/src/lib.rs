#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod provider;
mod types;

pub use backend::{Backend, BackendConfig};
pub use provider::{EditorialWorkflow, Provider};
pub use types::{
    CollectionSource, CollectionSpec, CommitAuthor, DeployPreview, FileChange, MediaUpload, Page,
    PersistOptions,
};

/// Tracing target for backend operations.
pub const TRACING_TARGET: &str = "verso_backend";
