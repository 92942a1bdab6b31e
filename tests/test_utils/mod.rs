//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use modelverse::ai::catalog::Catalog;
use modelverse::ai::chat::Orchestrator;
use modelverse::ai::provider::{SharedProvider, SimulatedProvider};
use modelverse::api::AppState;
use modelverse::api::app;
use modelverse::core::AppConfig;

/// Creates a test application router backed by the built-in catalog
/// and a provider that responds without any delay.
///
/// Every call gets its own state so tests can run in parallel.
pub fn test_app() -> Router {
    let catalog = Catalog::builtin();
    let provider = SimulatedProvider::instant(&catalog).expect("Failed to build provider");
    test_app_with_provider(Arc::new(provider))
}

/// Same as `test_app` but every model call goes to `provider`.
#[allow(dead_code)]
pub fn test_app_with_provider(provider: SharedProvider) -> Router {
    let catalog = Catalog::builtin();
    let orchestrator = Orchestrator::builder()
        .shared_provider(provider)
        .build()
        .expect("Failed to build orchestrator");

    let app_config = AppConfig {
        host: String::from("127.0.0.1"),
        port: String::from("2222"),
        default_model: String::from("mistral-7b-instruct"),
        default_chain: vec![
            String::from("mistral-7b-instruct"),
            String::from("deepseek-chat"),
        ],
        min_latency_ms: 0,
        max_latency_ms: 0,
        catalog_path: None,
        session_ttl_secs: 3600,
    };
    let app_state = AppState::new(orchestrator, catalog, app_config);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

/// Parse the `data:` lines of a Server-Sent Events body as JSON.
#[allow(dead_code)]
pub fn sse_events(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).expect("Event is not JSON"))
        .collect()
}
