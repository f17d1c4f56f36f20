//! Fork-based authorization for contributors without write access.
//!
//! A user with write access to the origin repository operates on it
//! directly. Anyone else gets a personal fork created on their behalf, and
//! all subsequent writes are redirected to it.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::Mutex;
use verso_client::{ApiRequest, Context, Method};
use verso_core::{Error, Result};

use crate::{TRACING_TARGET, api, wire};

/// Interval between existence probes while a freshly requested fork is
/// being provisioned.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Decides, once per session, which repository a user's writes target.
pub struct ForkWorkflow {
    origin_repo: String,
    /// Maintainer checks per login; the answer is stable for a session.
    maintainer_cache: Mutex<HashMap<String, bool>>,
    operating_repo: OnceLock<String>,
}

impl ForkWorkflow {
    pub fn new(origin_repo: impl Into<String>) -> Self {
        Self {
            origin_repo: origin_repo.into(),
            maintainer_cache: Mutex::new(HashMap::new()),
            operating_repo: OnceLock::new(),
        }
    }

    /// The repository writes should target, once [`authorize`] has run.
    ///
    /// [`authorize`]: Self::authorize
    pub fn operating_repo(&self) -> Option<&str> {
        self.operating_repo.get().map(String::as_str)
    }

    /// Resolves the operating repository for the signed-in user.
    ///
    /// Maintainers of the origin keep working on it directly. Everyone else
    /// gets a fork requested, and we wait for it to materialize before
    /// reporting success.
    pub async fn authorize(&self, ctx: &Context, login: &str) -> Result<String> {
        if let Some(repo) = self.operating_repo.get() {
            return Ok(repo.clone());
        }

        let repo = if self.is_origin_maintainer(ctx, login).await? {
            self.origin_repo.clone()
        } else {
            let fork = self.request_fork(ctx).await?;
            self.wait_for_fork(ctx, &fork).await?;
            fork
        };

        tracing::debug!(target: TRACING_TARGET, repo = %repo, "Resolved operating repository");
        let _ = self.operating_repo.set(repo.clone());
        Ok(repo)
    }

    async fn is_origin_maintainer(&self, ctx: &Context, login: &str) -> Result<bool> {
        if let Some(&known) = self.maintainer_cache.lock().await.get(login) {
            return Ok(known);
        }

        let request = ApiRequest::get(format!(
            "/repos/{}/collaborators/{}/permission",
            self.origin_repo, login
        ));
        let maintainer = match ctx.request_json(request).await {
            Ok(value) => {
                let level: wire::PermissionLevel = serde_json::from_value(value)?;
                matches!(level.permission.as_str(), "admin" | "write")
            }
            // Non-collaborators commonly surface as 403/404 rather than a
            // permission level of "none".
            Err(err) if err.is_not_found() || err.is_authorization() => false,
            Err(err) => return Err(err),
        };

        self.maintainer_cache
            .lock()
            .await
            .insert(login.to_owned(), maintainer);
        Ok(maintainer)
    }

    async fn request_fork(&self, ctx: &Context) -> Result<String> {
        let request = ApiRequest::get(format!("/repos/{}/forks", self.origin_repo))
            .with_method(Method::Post);
        let value = ctx.request_json(request).await?;
        let fork: wire::Fork = serde_json::from_value(value)?;
        tracing::debug!(target: TRACING_TARGET, fork = %fork.full_name, "Requested fork");
        Ok(fork.full_name)
    }

    /// Fork creation is asynchronous on the provider's side; probe until the
    /// repository answers. Only a missing repository keeps the loop going.
    async fn wait_for_fork(&self, ctx: &Context, fork: &str) -> Result<()> {
        let fork_ctx = ctx.with_repo(fork);
        loop {
            match api::repo(&fork_ctx).await {
                Ok(_) => return Ok(()),
                Err(err) if err.is_not_found() => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(err) => {
                    return Err(Error::external()
                        .with_message(format!("fork {fork} did not become available"))
                        .with_source(err));
                }
            }
        }
    }
}

impl std::fmt::Debug for ForkWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForkWorkflow")
            .field("origin_repo", &self.origin_repo)
            .field("operating_repo", &self.operating_repo.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::testing::{ScriptedExecutor, context, json_response};

    #[tokio::test]
    async fn test_maintainer_operates_on_origin() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/collaborators/tester/permission",
            json_response(200, json!({ "permission": "write" })),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let workflow = ForkWorkflow::new("org/site");
        let repo = workflow.authorize(&ctx, "tester").await.unwrap();
        assert_eq!(repo, "org/site");
        assert_eq!(workflow.operating_repo(), Some("org/site"));
        assert_eq!(executor.hits("POST", "/repos/org/site/forks"), 0);
    }

    #[tokio::test]
    async fn test_read_only_permission_triggers_fork() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/collaborators/tester/permission",
            json_response(200, json!({ "permission": "read" })),
        );
        executor.on(
            "POST",
            "/repos/org/site/forks",
            json_response(202, json!({ "full_name": "tester/site" })),
        );
        executor.on(
            "GET",
            "/repos/tester/site",
            json_response(200, json!({ "full_name": "tester/site" })),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let workflow = ForkWorkflow::new("org/site");
        let repo = workflow.authorize(&ctx, "tester").await.unwrap();
        assert_eq!(repo, "tester/site");
        assert_eq!(executor.hits("POST", "/repos/org/site/forks"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_fork_to_materialize() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/collaborators/tester/permission",
            json_response(404, json!({ "message": "Not Found" })),
        );
        executor.on(
            "POST",
            "/repos/org/site/forks",
            json_response(202, json!({ "full_name": "tester/site" })),
        );
        // Two probes miss before the fork answers.
        executor.on("GET", "/repos/tester/site", json_response(404, json!({})));
        executor.on("GET", "/repos/tester/site", json_response(404, json!({})));
        executor.on(
            "GET",
            "/repos/tester/site",
            json_response(200, json!({ "full_name": "tester/site" })),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let workflow = ForkWorkflow::new("org/site");
        let repo = workflow.authorize(&ctx, "tester").await.unwrap();
        assert_eq!(repo, "tester/site");
        // The fork is requested once; only the existence probe repeats.
        assert_eq!(executor.hits("POST", "/repos/org/site/forks"), 1);
        assert_eq!(executor.hits("GET", "/repos/tester/site"), 3);
    }

    #[tokio::test]
    async fn test_maintainer_check_is_memoized() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.on(
            "GET",
            "/repos/org/site/collaborators/tester/permission",
            json_response(200, json!({ "permission": "admin" })),
        );
        let ctx = context(Arc::clone(&executor), "org/site");

        let workflow = ForkWorkflow::new("org/site");
        assert!(workflow.is_origin_maintainer(&ctx, "tester").await.unwrap());
        assert!(workflow.is_origin_maintainer(&ctx, "tester").await.unwrap());
        assert_eq!(
            executor.hits("GET", "/repos/org/site/collaborators/tester/permission"),
            1
        );
    }
}
