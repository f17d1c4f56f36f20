//! GitHub adapter configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the GitHub provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Origin repository (`owner/name`).
    pub repo: String,
    /// Route non-maintainer contributions through personal forks.
    #[serde(default)]
    pub fork_workflow: bool,
    /// Enable the editorial (unpublished change-set) workflow.
    #[serde(default)]
    pub editorial_workflow: bool,
    /// Merge published change sets with a squash merge instead of a merge
    /// commit.
    #[serde(default)]
    pub squash_merges: bool,
}

impl GithubConfig {
    /// Creates a configuration for a repository with workflows off.
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            fork_workflow: false,
            editorial_workflow: false,
            squash_merges: false,
        }
    }

    /// Enables the editorial workflow.
    #[must_use]
    pub fn with_editorial_workflow(mut self) -> Self {
        self.editorial_workflow = true;
        self
    }

    /// Enables the fork workflow.
    #[must_use]
    pub fn with_fork_workflow(mut self) -> Self {
        self.fork_workflow = true;
        self
    }

    /// Enables squash merges for publishing.
    #[must_use]
    pub fn with_squash_merges(mut self) -> Self {
        self.squash_merges = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GithubConfig::new("owner/repo");
        assert!(!config.fork_workflow);
        assert!(!config.editorial_workflow);
        assert!(!config.squash_merges);
    }
}
