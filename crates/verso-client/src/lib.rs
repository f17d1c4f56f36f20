#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod auth;
mod config;
mod context;
mod error;
mod executor;
mod fetcher;
mod request;
mod response;

pub use auth::AuthGate;
pub use config::ClientConfig;
pub use context::{Context, ContextBuilder, CredentialsSource, StaticCredentials};
pub use error::Error;
pub use executor::{HttpExecutor, RequestExecutor};
pub use fetcher::{DEFAULT_MAX_CONCURRENT, Fetcher};
pub use request::{ApiRequest, CacheMode, Method};
pub use response::{ApiResponse, Format};

/// Tracing target for client operations.
pub const TRACING_TARGET: &str = "verso_client";
