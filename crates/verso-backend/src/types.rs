//! Shared operation argument and result types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use verso_core::{Cursor, Entry, FileRef};

/// Where a collection's entries live in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSource {
    /// Entries are the files of a folder with a given extension.
    Folder {
        /// Folder path relative to the repository root.
        path: String,
        /// File extension entries must carry.
        extension: String,
    },
    /// Entries are an explicit list of files.
    Files {
        /// The collection's files.
        files: Vec<FileRef>,
    },
}

/// A collection of content entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Collection name, used in content keys.
    pub name: String,
    /// Entry source.
    pub source: CollectionSource,
}

impl CollectionSpec {
    /// Creates a folder collection with the default `md` extension.
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: CollectionSource::Folder {
                path: path.into(),
                extension: "md".to_owned(),
            },
        }
    }

    /// Creates a files collection.
    pub fn files(name: impl Into<String>, files: Vec<FileRef>) -> Self {
        Self {
            name: name.into(),
            source: CollectionSource::Files { files },
        }
    }
}

/// One page of listed entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Fetched entries.
    pub entries: Vec<Entry>,
    /// Cursor for further traversal, when more pages exist.
    pub cursor: Option<Cursor>,
}

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// Author name.
    pub name: String,
    /// Author email.
    pub email: String,
}

/// Options for a persist operation. Each persist writes one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOptions {
    /// Commit message.
    pub commit_message: String,
    /// True when the target file already exists; some providers require
    /// different verbs for create and update.
    pub update_file: bool,
    /// Branch override; the context branch is used when absent.
    pub branch: Option<String>,
    /// Commit author override.
    pub author: Option<CommitAuthor>,
}

impl PersistOptions {
    /// Creates options for a new file.
    pub fn create(commit_message: impl Into<String>) -> Self {
        Self {
            commit_message: commit_message.into(),
            update_file: false,
            branch: None,
            author: None,
        }
    }

    /// Creates options for updating an existing file.
    pub fn update(commit_message: impl Into<String>) -> Self {
        Self {
            commit_message: commit_message.into(),
            update_file: true,
            branch: None,
            author: None,
        }
    }

    /// Sets the branch override.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the commit author.
    #[must_use]
    pub fn with_author(mut self, author: CommitAuthor) -> Self {
        self.author = Some(author);
        self
    }
}

/// A text file change to persist as one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Target path relative to the repository root.
    pub path: String,
    /// New file content.
    pub content: String,
}

/// A binary file to persist as one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// Target path relative to the repository root.
    pub path: String,
    /// File name.
    pub name: String,
    /// Raw content.
    pub content: Bytes,
}

/// A deploy preview inferred from provider commit statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPreview {
    /// Preview URL.
    pub url: String,
    /// Status state, e.g. `success`, `pending`, `failure`.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_collection_defaults_to_md() {
        let spec = CollectionSpec::folder("posts", "content/posts");
        match spec.source {
            CollectionSource::Folder { extension, .. } => assert_eq!(extension, "md"),
            CollectionSource::Files { .. } => panic!("expected folder source"),
        }
    }

    #[test]
    fn test_persist_options_distinguish_create_and_update() {
        assert!(!PersistOptions::create("add post").update_file);
        assert!(PersistOptions::update("edit post").update_file);
    }
}
