//! Scripted HTTP plumbing for provider tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use verso_client::{ApiRequest, ApiResponse, Context, RequestExecutor, StaticCredentials};
use verso_core::{Credentials, Result};

pub(crate) const TEST_ROOT: &str = "https://api.github.test";

/// Executor that answers from per-route response queues.
///
/// Routes are keyed by `"METHOD /path"`. The last queued response for a
/// route repeats once the queue would otherwise run dry, which keeps
/// polling tests short. An unrouted request panics, failing the test.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    routes: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(&self, method: &str, path: &str, response: ApiResponse) {
        self.routes
            .lock()
            .expect("routes poisoned")
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back(response);
    }

    /// Number of requests a route has answered.
    pub(crate) fn hits(&self, method: &str, path: &str) -> usize {
        self.hits
            .lock()
            .expect("hits poisoned")
            .get(&format!("{method} {path}"))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse> {
        let path = request
            .url
            .strip_prefix(TEST_ROOT)
            .unwrap_or(&request.url)
            .to_owned();
        let key = format!("{} {}", request.method.as_ref(), path);
        *self
            .hits
            .lock()
            .expect("hits poisoned")
            .entry(key.clone())
            .or_default() += 1;
        let mut routes = self.routes.lock().expect("routes poisoned");
        let queue = routes
            .get_mut(&key)
            .unwrap_or_else(|| panic!("unscripted request: {key}"));
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            Ok(queue.front().cloned().unwrap_or_else(|| {
                panic!("route exhausted: {key}")
            }))
        }
    }
}

pub(crate) fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse::new(
        status,
        [("content-type", "application/json")],
        body.to_string(),
    )
}

pub(crate) fn context(executor: Arc<ScriptedExecutor>, repo: &str) -> Context {
    let credentials = Credentials::new("test-token").with_login("tester");
    Context::builder("github")
        .api_root(TEST_ROOT)
        .repo(repo)
        .branch("main")
        .credentials(Arc::new(StaticCredentials(credentials)))
        .executor(executor)
        .build()
        .expect("test context")
}
