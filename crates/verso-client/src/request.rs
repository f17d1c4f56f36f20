//! Immutable request values.
//!
//! An [`ApiRequest`] is composed by successive pure transformations. Each
//! `with_*` method consumes the request and returns a new value, none
//! mutates in place. Transformations are order-independent with respect to
//! distinct fields, so adapters can layer root, auth, and headers freely.

use std::collections::BTreeMap;

use bytes::Bytes;
use strum::{AsRefStr, IntoStaticStr};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

/// Cache directive forwarded to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Normal caching behavior.
    #[default]
    Default,
    /// Bypass intermediary caches (`Cache-Control: no-store`).
    NoStore,
}

/// An unsent HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, or a path awaiting [`ApiRequest::with_root`].
    pub url: String,
    /// Query parameters.
    pub params: BTreeMap<String, String>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
    /// Cache directive.
    pub cache: CacheMode,
}

impl ApiRequest {
    /// Creates a GET request for the given URL or path.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            cache: CacheMode::Default,
        }
    }

    /// Creates a request from an absolute URL, e.g. a cursor navigation link.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::get(url)
    }

    /// Returns true if the URL is absolute.
    pub fn has_root(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }

    /// Prepends the API root unless the URL is already absolute.
    #[must_use]
    pub fn with_root(mut self, root: &str) -> Self {
        if !self.has_root() {
            let path = self.url.trim_start_matches('/');
            self.url = format!("{}/{}", root.trim_end_matches('/'), path);
        }
        self
    }

    /// Replaces the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds query parameters, overriding existing keys.
    #[must_use]
    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self.params.insert(key.into(), value.into());
        }
        self
    }

    /// Adds headers, overriding existing keys.
    #[must_use]
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.headers.insert(key.into(), value.into());
        }
        self
    }

    /// Adds headers only where the request does not already set them.
    #[must_use]
    pub fn with_default_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.headers.entry(key.into()).or_insert_with(|| value.into());
        }
        self
    }

    /// Adds a cache-busting timestamp parameter.
    #[must_use]
    pub fn with_timestamp(self) -> Self {
        let ts = jiff::Timestamp::now().as_millisecond();
        self.with_params([("ts", ts.to_string())])
    }

    /// Attaches a bearer token.
    #[must_use]
    pub fn authorize(self, token: &str) -> Self {
        self.with_headers([("Authorization", format!("Bearer {token}"))])
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and content type.
    pub fn with_json_body(self, body: &impl serde::Serialize) -> verso_core::Result<Self> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self
            .with_headers([("Content-Type", "application/json")])
            .with_body(bytes))
    }

    /// Sets the cache directive.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }
}
