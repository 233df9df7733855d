use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hellosvc_api::config::ServerConfig;
use hellosvc_api::engine::JobDispatcher;
use hellosvc_api::router::build_app_router;
use hellosvc_api::state::AppState;
use hellosvc_broker::{ConfirmMode, MemoryBroker};
use hellosvc_db::MemoryStore;

/// Deadline the test dispatcher waits for a confirm.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 60,
        shutdown_timeout_secs: 30,
    }
}

/// Everything an API test needs: the router plus handles on the in-memory
/// store and broker behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub broker: MemoryBroker,
}

/// Build the full application router over in-memory backends, with the
/// broker answering publishes according to `mode`.
pub fn build_test_app(mode: ConfirmMode) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let broker = MemoryBroker::with_confirm_mode(mode);

    let dispatcher = JobDispatcher::new(
        store.clone(),
        Arc::new(broker.clone()),
        CONFIRM_TIMEOUT,
    );
    let state = AppState {
        jobs: store.clone(),
        users: store.clone(),
        dispatcher: Arc::new(dispatcher),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        broker,
    }
}

/// Send a request without a body.
#[allow(dead_code)]
pub async fn send_empty(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a request with a raw JSON body.
#[allow(dead_code)]
pub async fn send_json(app: Router, method: Method, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// GET a path.
#[allow(dead_code)]
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send_empty(app, Method::GET, uri).await
}

/// Collect a response body and parse it as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as UTF-8 text.
#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
