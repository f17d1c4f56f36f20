//! Opaque pagination cursor.
//!
//! Cursors are small serializable tokens handed to the caller by one paging
//! call and consumed by exactly the next traversal call. A cursor carries:
//!
//! - `actions`: the traversal directions valid from the current page,
//! - `meta` (optional): zero-based page index, total count, page size, and
//!   page count, all non-negative,
//! - `data`: an opaque JSON payload (typically navigation links) that must
//!   survive a JSON encode/decode round trip unchanged.
//!
//! No other keys are permitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// Symbolic traversal directions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    IntoStaticStr,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CursorAction {
    /// Jump to the first page.
    First,
    /// Step to the previous page.
    Prev,
    /// Step to the next page.
    Next,
    /// Jump to the last page.
    Last,
}

impl CursorAction {
    /// The mirrored direction, used when presenting an oldest-first listing
    /// as newest-first.
    pub fn reversed(self) -> Self {
        match self {
            Self::First => Self::Last,
            Self::Last => Self::First,
            Self::Next => Self::Prev,
            Self::Prev => Self::Next,
        }
    }
}

/// Recognized numeric pagination metadata. All indices are zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorMeta {
    /// Zero-based index of the current page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Total number of entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Entries per page.
    #[serde(
        default,
        rename = "pageSize",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_size: Option<u64>,
    /// Zero-based index of the last page.
    #[serde(
        default,
        rename = "pageCount",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_count: Option<u64>,
}

/// Normalized provider paging metadata, converted from the 1-based values
/// providers put in response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based index of the current page.
    pub index: u64,
    /// Zero-based index of the last page.
    pub page_count: u64,
    /// Entries per page.
    pub page_size: u64,
    /// Total number of entries.
    pub count: u64,
}

impl PageInfo {
    /// Normalizes 1-based page headers into zero-based values.
    pub fn from_one_based(page: u64, total_pages: u64, page_size: u64, count: u64) -> Self {
        Self {
            index: page.saturating_sub(1),
            page_count: total_pages.saturating_sub(1),
            page_size,
            count,
        }
    }
}

/// Opaque pagination token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Traversal directions valid from the current page.
    pub actions: Vec<CursorAction>,
    /// Pagination metadata, when the provider exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<CursorMeta>,
    /// Opaque navigation payload, e.g. `{"links": {"next": "..."}}`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

const VALID_META_KEYS: [&str; 4] = ["index", "count", "pageSize", "pageCount"];

impl Cursor {
    /// Creates a cursor with the given actions and no metadata or data.
    pub fn new(actions: impl IntoIterator<Item = CursorAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            meta: None,
            data: Value::Null,
        }
    }

    /// Sets the pagination metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: CursorMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Sets the opaque navigation payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Builds a cursor from normalized paging metadata and navigation links.
    ///
    /// Allowed actions are derived from the page position, never copied from
    /// the provider's `Link` rels: `prev`/`first` require `index > 0`,
    /// `next`/`last` require `index < page_count`. This guards against
    /// providers that include a rel link without it being a meaningful
    /// action at the boundary pages. The links themselves are kept verbatim
    /// in `data` for later traversal.
    pub fn from_page_info(info: &PageInfo, links: &BTreeMap<String, String>) -> Self {
        let actions = [
            CursorAction::First,
            CursorAction::Prev,
            CursorAction::Next,
            CursorAction::Last,
        ]
        .into_iter()
        .filter(|action| match action {
            CursorAction::First | CursorAction::Prev => info.index > 0,
            CursorAction::Next | CursorAction::Last => info.index < info.page_count,
        })
        .collect();

        let links: serde_json::Map<String, Value> = links
            .iter()
            .map(|(rel, url)| (rel.clone(), Value::String(url.clone())))
            .collect();

        Self {
            actions,
            meta: Some(CursorMeta {
                index: Some(info.index),
                count: Some(info.count),
                page_size: Some(info.page_size),
                page_count: Some(info.page_count),
            }),
            data: serde_json::json!({ "links": links }),
        }
    }

    /// Returns true if the given traversal direction is valid.
    pub fn has_action(&self, action: CursorAction) -> bool {
        self.actions.contains(&action)
    }

    /// Resolves the navigation link stored for the given action.
    pub fn link(&self, action: CursorAction) -> Result<&str> {
        self.data
            .get("links")
            .and_then(|links| links.get(action.as_ref()))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::cursor_validation()
                    .with_message(format!("cursor has no link for action {}", action.as_ref()))
            })
    }

    /// Mirrors the cursor for presenting an oldest-first listing newest-first.
    ///
    /// Swaps `first`/`last` and `next`/`prev` in both the action set and the
    /// `data.links` keys, and re-expresses the page index as
    /// `page_count - index` when both are known. Applying the reversal twice
    /// yields the original cursor.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let actions = self.actions.iter().map(|a| a.reversed()).collect();

        // Without a page count the mirrored index is undefined; leaving the
        // index alone keeps double reversal an identity.
        let meta = self.meta.clone().map(|meta| match (meta.index, meta.page_count) {
            (Some(index), Some(page_count)) => CursorMeta {
                index: Some(page_count.saturating_sub(index)),
                ..meta
            },
            _ => meta,
        });

        let mut data = self.data.clone();
        if let Some(links) = data.get("links").and_then(Value::as_object) {
            let reversed: serde_json::Map<String, Value> = links
                .iter()
                .map(|(rel, url)| {
                    let rel = rel
                        .parse::<CursorAction>()
                        .map(|a| a.reversed().as_ref().to_owned())
                        .unwrap_or_else(|_| rel.clone());
                    (rel, url.clone())
                })
                .collect();
            data["links"] = Value::Object(reversed);
        }

        Self {
            actions,
            meta,
            data,
        }
    }

    /// Validates a candidate JSON value and converts it into a cursor.
    ///
    /// A candidate is valid iff `actions` is an array of known directions,
    /// `data` (if present) survives a JSON round trip unchanged, `meta`
    /// (if present) holds only the four recognized non-negative numeric
    /// fields, and no other top-level keys exist.
    pub fn validate(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::cursor_validation().with_message("cursor must be an object"))?;

        for key in obj.keys() {
            if !matches!(key.as_str(), "actions" | "meta" | "data") {
                return Err(Error::cursor_validation()
                    .with_message(format!("unexpected cursor key: {key}")));
            }
        }

        let actions = obj
            .get("actions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::cursor_validation().with_message("cursor actions must be an array")
            })?;
        for action in actions {
            let known = action
                .as_str()
                .is_some_and(|s| s.parse::<CursorAction>().is_ok());
            if !known {
                return Err(Error::cursor_validation()
                    .with_message(format!("unknown cursor action: {action}")));
            }
        }

        if let Some(data) = obj.get("data") {
            let encoded = serde_json::to_string(data).map_err(|err| {
                Error::cursor_validation()
                    .with_message("cursor data is not serializable")
                    .with_source(err)
            })?;
            let round_tripped: Value = serde_json::from_str(&encoded).map_err(|err| {
                Error::cursor_validation()
                    .with_message("cursor data is not round-trip stable")
                    .with_source(err)
            })?;
            if &round_tripped != data {
                return Err(Error::cursor_validation()
                    .with_message("cursor data changed across a JSON round trip"));
            }
        }

        if let Some(meta) = obj.get("meta") {
            let meta = meta.as_object().ok_or_else(|| {
                Error::cursor_validation().with_message("cursor meta must be an object")
            })?;
            for (key, value) in meta {
                if !VALID_META_KEYS.contains(&key.as_str()) {
                    return Err(Error::cursor_validation()
                        .with_message(format!("unexpected cursor meta key: {key}")));
                }
                if value.as_u64().is_none() {
                    return Err(Error::cursor_validation().with_message(format!(
                        "cursor meta field {key} must be a non-negative integer"
                    )));
                }
            }
        }

        serde_json::from_value(value.clone()).map_err(|err| {
            Error::cursor_validation()
                .with_message("cursor failed to deserialize")
                .with_source(err)
        })
    }
}
