//! Editorial (unpublished change-set) types and content-key derivation.
//!
//! An unpublished change set is a provider branch holding one or more file
//! changes awaiting review. The branch name is derived deterministically
//! from the collection name and entry slug, so the branch itself is the
//! single source of truth; no local queue of pending transitions exists.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

/// Reserved branch prefix for unpublished change sets.
pub const BRANCH_PREFIX: &str = "cms";

/// Derives the stable content key for a collection entry.
pub fn content_key(collection: &str, slug: &str) -> String {
    format!("{collection}/{slug}")
}

/// Maps a content key to its provider branch name.
pub fn branch_name(content_key: &str) -> String {
    format!("{BRANCH_PREFIX}/{content_key}")
}

/// Extracts the content key from a fully qualified branch ref.
///
/// Returns `None` for refs outside the reserved prefix, which discovery
/// must skip.
pub fn content_key_from_ref(git_ref: &str) -> Option<&str> {
    let branch = git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref);
    let key = branch.strip_prefix(BRANCH_PREFIX)?.strip_prefix('/')?;
    (!key.is_empty()).then_some(key)
}

/// Extracts the entry slug (the final segment) from a content key.
pub fn slug_from_content_key(content_key: &str) -> &str {
    content_key.rsplit('/').next().unwrap_or(content_key)
}

/// Review status of an unpublished change set.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsRefStr,
    IntoStaticStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowStatus {
    /// Work in progress, not yet submitted for review.
    Draft,
    /// Submitted and awaiting review.
    PendingReview,
    /// Approved and awaiting publication.
    PendingPublish,
}

/// Reference to the provider-side review (pull/merge request).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRef {
    /// Provider-assigned review number.
    pub number: u64,
    /// Head commit sha of the review branch.
    pub head: String,
}

/// Metadata describing one unpublished change set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSetMetadata {
    /// Collection the entry belongs to.
    pub collection: String,
    /// Target file path of the entry.
    pub path: String,
    /// Review status.
    pub status: WorkflowStatus,
    /// Author identity, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Linked review, once one has been opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewRef>,
}

/// A resolved unpublished change set: metadata plus branch-tip content.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Entry slug, derived from the branch name suffix.
    pub slug: String,
    /// Stable content key.
    pub content_key: String,
    /// Change metadata.
    pub metadata: ChangeSetMetadata,
    /// File content at the branch tip.
    pub data: String,
    /// True when the change edits an existing published file rather than
    /// creating a new one.
    pub is_modification: bool,
}
