//! File references, entries, and media assets.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A reference to a file in the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Path relative to the repository root.
    pub path: String,
    /// Content-addressable id (e.g. blob hash), used as a cache key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display label for file-collection entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FileRef {
    /// Creates a reference from a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: None,
            label: None,
        }
    }

    /// Sets the content-addressable id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty()).then_some(ext)
    }
}

/// Fetched file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    /// Decoded text content.
    Text(String),
    /// Raw bytes.
    Blob(Bytes),
}

impl FileData {
    /// Returns the text content, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blob(_) => None,
        }
    }

    /// Returns the content as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Blob(bytes) => bytes,
        }
    }
}

/// A file reference together with its fetched content.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The requested reference.
    pub file: FileRef,
    /// The fetched content.
    pub data: FileData,
}

impl Entry {
    /// Creates an entry pairing a reference with fetched content.
    pub fn new(file: FileRef, data: FileData) -> Self {
        Self { file, data }
    }
}

/// A media asset as listed in the media index.
///
/// Listing never downloads content; the asset carries enough identity for
/// the provider to fetch it on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Content-addressable id (blob hash).
    pub id: String,
    /// File name.
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// Size in bytes, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl MediaAsset {
    /// Returns the file reference for fetching this asset's content.
    pub fn file_ref(&self) -> FileRef {
        FileRef::new(&self.path).with_id(&self.id)
    }
}
