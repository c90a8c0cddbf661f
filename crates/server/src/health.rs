use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use skyhop_core::ledger::LedgerSnapshot;

use crate::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: String,
    pub agent_initialized: bool,
    pub planner: &'static str,
    pub budget: LedgerSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let agent_initialized = !state.runtime.tools().is_empty();

    let payload = HealthResponse {
        status: if agent_initialized { "healthy" } else { "degraded" },
        timestamp: Utc::now().to_rfc3339(),
        environment: state.info.environment.clone(),
        agent_initialized,
        planner: state.runtime.planner_kind(),
        budget: state.ledger.snapshot(),
    };

    let status_code =
        if agent_initialized { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use rust_decimal::Decimal;
    use skyhop_agent::planner::ScriptedPlanner;
    use skyhop_agent::runtime::{AgentRuntime, RuntimeSettings};
    use skyhop_agent::tools::ToolRegistry;
    use skyhop_core::config::AppConfig;
    use skyhop_core::ledger::BudgetLedger;

    use crate::bootstrap::build_state;
    use crate::health::health;
    use crate::{AppState, ServiceInfo};

    #[tokio::test]
    async fn health_reports_healthy_agent_and_ledger_snapshot() {
        let state = build_state(&AppConfig::default()).expect("state");

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "healthy");
        assert!(payload.agent_initialized);
        assert_eq!(payload.environment, "main");
        assert_eq!(payload.budget.total, Decimal::ZERO);
        assert_eq!(payload.budget.limit, Decimal::from(1000));
    }

    #[tokio::test]
    async fn health_is_degraded_without_tools() {
        let state = AppState::new(
            AgentRuntime::new(
                Arc::new(ScriptedPlanner),
                ToolRegistry::default(),
                RuntimeSettings::default(),
            ),
            Arc::new(BudgetLedger::default()),
            ServiceInfo {
                environment: "test".to_string(),
                model: "gpt-4".to_string(),
                currency: "$".to_string(),
            },
        );

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(!payload.agent_initialized);
    }
}
