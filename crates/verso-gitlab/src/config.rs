//! GitLab adapter configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the GitLab provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitlabConfig {
    /// Project path (`group/project`).
    pub repo: String,
    /// Entries requested per page when listing a folder.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page_size() -> u64 {
    20
}

impl GitlabConfig {
    /// Creates a configuration for a project with the default page size.
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            page_size: default_page_size(),
        }
    }

    /// Sets the listing page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}
