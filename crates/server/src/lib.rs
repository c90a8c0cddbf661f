//! HTTP boundary for the flight booking agent.

pub mod api;
pub mod bootstrap;
pub mod health;

use std::sync::Arc;

use axum::Router;
use skyhop_agent::runtime::AgentRuntime;
use skyhop_core::ledger::BudgetLedger;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Static facts about this deployment, reported by the info endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    pub environment: String,
    pub model: String,
    pub currency: String,
}

/// Shared by every request; the ledger inside is the process-wide budget.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
    pub ledger: Arc<BudgetLedger>,
    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(runtime: AgentRuntime, ledger: Arc<BudgetLedger>, info: ServiceInfo) -> Self {
        Self { runtime: Arc::new(runtime), ledger, info: Arc::new(info) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be json")
        };
        (status, body)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }
}
