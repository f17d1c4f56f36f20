#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod api;
mod config;
mod pagination;
mod provider;
#[cfg(test)]
mod testing;
mod wire;

pub use config::GitlabConfig;
pub use provider::GitlabProvider;

/// Default GitLab API root.
pub const DEFAULT_API_ROOT: &str = "https://gitlab.com/api/v4";

/// Minimum access level granting write permission (Developer).
pub const WRITE_ACCESS: u64 = 30;

/// Tracing target for GitLab operations.
pub const TRACING_TARGET: &str = "verso_gitlab";
