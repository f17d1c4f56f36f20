//! Error types for the HTTP executor.

use thiserror::Error;

/// Error type for executor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Request URL was invalid.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<Error> for verso_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    verso_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    verso_core::Error::network()
                        .with_message("connection failed")
                        .with_source(e)
                } else {
                    verso_core::Error::network()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Url(e) => verso_core::Error::configuration()
                .with_message(e.to_string())
                .with_source(e),
            Error::Serde(e) => verso_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}
