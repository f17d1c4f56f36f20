//! Scripted HTTP plumbing for provider tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use verso_client::{ApiRequest, ApiResponse, Context, RequestExecutor, StaticCredentials};
use verso_core::{Credentials, Result};

pub(crate) const TEST_ROOT: &str = "https://gitlab.test/api/v4";

/// Executor answering from per-route response queues, keyed by
/// `"METHOD /path"` with the query string ignored. The last response of a
/// route repeats; an unrouted request panics, failing the test.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    routes: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
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
}

#[async_trait::async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse> {
        let path = request
            .url
            .strip_prefix(TEST_ROOT)
            .unwrap_or(&request.url);
        let path = path.split('?').next().unwrap_or(path).to_owned();
        let key = format!("{} {}", request.method.as_ref(), path);
        let mut routes = self.routes.lock().expect("routes poisoned");
        let queue = routes
            .get_mut(&key)
            .unwrap_or_else(|| panic!("unscripted request: {key}"));
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            Ok(queue
                .front()
                .cloned()
                .unwrap_or_else(|| panic!("route exhausted: {key}")))
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

/// A paginated listing response with GitLab's paging headers attached.
pub(crate) fn listing_response(
    body: serde_json::Value,
    page: u64,
    total_pages: u64,
    per_page: u64,
    total: u64,
    links: &[(&str, &str)],
) -> ApiResponse {
    let link_header = links
        .iter()
        .map(|(rel, url)| format!("<{url}>; rel=\"{rel}\""))
        .collect::<Vec<_>>()
        .join(", ");
    ApiResponse::new(
        200,
        [
            ("content-type", "application/json".to_string()),
            ("x-page", page.to_string()),
            ("x-total-pages", total_pages.to_string()),
            ("x-per-page", per_page.to_string()),
            ("x-total", total.to_string()),
            ("link", link_header),
        ],
        body.to_string(),
    )
}

pub(crate) fn text_response(text: &str) -> ApiResponse {
    ApiResponse::new(200, [("content-type", "text/plain")], text.to_owned())
}

pub(crate) fn context(executor: Arc<ScriptedExecutor>, repo: &str) -> Context {
    let credentials = Credentials::new("test-token").with_login("tester");
    Context::builder("gitlab")
        .api_root(TEST_ROOT)
        .repo(repo)
        .branch("main")
        .credentials(Arc::new(StaticCredentials(credentials)))
        .executor(executor)
        .build()
        .expect("test context")
}
