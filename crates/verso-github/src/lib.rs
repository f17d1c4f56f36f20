#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod api;
mod config;
mod editorial;
mod fork;
mod provider;
#[cfg(test)]
mod testing;
mod wire;

pub use config::GithubConfig;
pub use fork::{ForkWorkflow, POLL_INTERVAL};
pub use provider::GithubProvider;

/// Default GitHub API root.
pub const DEFAULT_API_ROOT: &str = "https://api.github.com";

/// Tracing target for GitHub operations.
pub const TRACING_TARGET: &str = "verso_github";
