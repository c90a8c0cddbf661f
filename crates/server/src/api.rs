use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use skyhop_agent::conversation::IntentExtractor;
use skyhop_agent::runtime::{AgentOutcome, BookingStatus, OrchestratorFailure};
use skyhop_core::domain::booking::{BookingRequest, RawBookingRequest};
use skyhop_core::errors::{ApplicationError, DomainError, InterfaceError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

pub const SERVICE_NAME: &str = "Agentic AI Autonomous Flight Booking API";
pub const AGENT_TYPE: &str = "Autonomous Flight Booking Agent";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/agent-info", get(agent_info))
        .route("/api/v1/budget", get(budget))
        .route("/api/v1/book-flight", post(book_flight))
        .route("/api/v1/book-flight/text", post(book_flight_from_text))
}

#[derive(Debug, Serialize)]
pub struct ServiceBanner {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AgentPrinciples {
    pub perception: &'static str,
    pub planning: &'static str,
    pub action: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub agent_type: &'static str,
    pub principles: AgentPrinciples,
    pub tools: Vec<ToolSummary>,
    pub planner: &'static str,
    pub model: String,
    pub max_iterations: u32,
}

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    pub total: Decimal,
    pub limit: Decimal,
    pub remaining: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct TextBookingRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub error: &'static str,
    pub correlation_id: String,
    /// Set when the run charged the budget before failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agent_reasoning: Vec<String>,
}

/// HTTP rendering of an [`InterfaceError`], plus the progress of a failed
/// agent run when there was one.
#[derive(Debug)]
pub struct ApiError {
    error: InterfaceError,
    run: Option<OrchestratorFailure>,
}

impl ApiError {
    fn from_failure(failure: OrchestratorFailure, correlation_id: &str) -> Self {
        let error = ApplicationError::from(failure.error.clone()).into_interface(correlation_id);
        Self { error, run: Some(failure) }
    }
}

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self { error: value, run: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            InterfaceError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let (booking_id, pnr, agent_reasoning) = match self.run {
            Some(run) => (run.booking_id, run.pnr, run.trace),
            None => (None, None, Vec::new()),
        };
        let body = ErrorBody {
            detail: self.error.message().to_string(),
            error: self.error.user_message(),
            correlation_id: self.error.correlation_id().to_string(),
            booking_id,
            pnr,
            agent_reasoning,
        };
        (status, Json(body)).into_response()
    }
}

async fn root() -> Json<ServiceBanner> {
    Json(ServiceBanner {
        message: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

async fn agent_info(State(state): State<AppState>) -> Json<AgentInfo> {
    let tools = state
        .runtime
        .tools()
        .descriptors()
        .into_iter()
        .map(|descriptor| ToolSummary {
            name: descriptor.name.as_str(),
            description: descriptor.description,
        })
        .collect();

    Json(AgentInfo {
        agent_type: AGENT_TYPE,
        principles: AgentPrinciples {
            perception: "Understands booking requests from structured input or free text",
            planning: "Plans search, booking, and calendar steps in order",
            action: "Executes tools under budget guardrails",
        },
        tools,
        planner: state.runtime.planner_kind(),
        model: state.info.model.clone(),
        max_iterations: state.runtime.settings().max_iterations,
    })
}

async fn budget(State(state): State<AppState>) -> Json<BudgetStatus> {
    let snapshot = state.ledger.snapshot();
    Json(BudgetStatus {
        total: snapshot.total,
        limit: snapshot.limit,
        remaining: snapshot.remaining,
        currency: state.info.currency.clone(),
    })
}

async fn book_flight(
    State(state): State<AppState>,
    payload: Result<Json<RawBookingRequest>, JsonRejection>,
) -> Result<Json<AgentOutcome>, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(raw) = payload.map_err(|rejection| malformed(&correlation_id, rejection))?;

    let request = raw.validate().map_err(|error| {
        warn!(
            event_name = "api.booking.invalid_request",
            correlation_id = %correlation_id,
            field = error.field(),
            "booking request failed validation"
        );
        ApplicationError::from(DomainError::from(error)).into_interface(correlation_id.as_str())
    })?;

    run_booking(&state, &request, &correlation_id).await
}

async fn book_flight_from_text(
    State(state): State<AppState>,
    payload: Result<Json<TextBookingRequest>, JsonRejection>,
) -> Result<Json<AgentOutcome>, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(body) = payload.map_err(|rejection| malformed(&correlation_id, rejection))?;

    let intent = IntentExtractor::new().extract(&body.text);
    let request = intent.into_request().map_err(|prompt| {
        info!(
            event_name = "api.booking.clarification_needed",
            correlation_id = %correlation_id,
            "free-text booking request is incomplete"
        );
        InterfaceError::UnprocessableEntity { message: prompt, correlation_id: correlation_id.clone() }
    })?;

    run_booking(&state, &request, &correlation_id).await
}

async fn run_booking(
    state: &AppState,
    request: &BookingRequest,
    correlation_id: &str,
) -> Result<Json<AgentOutcome>, ApiError> {
    let outcome = state
        .runtime
        .handle_booking(request, correlation_id)
        .await
        .map_err(|failure| ApiError::from_failure(failure, correlation_id))?;

    if outcome.status == BookingStatus::InvalidInput {
        return Err(ApplicationError::ToolInput(outcome.message).into_interface(correlation_id).into());
    }

    Ok(Json(outcome))
}

fn malformed(correlation_id: &str, rejection: JsonRejection) -> ApiError {
    InterfaceError::UnprocessableEntity {
        message: rejection.body_text(),
        correlation_id: correlation_id.to_string(),
    }
    .into()
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::Router;
    use rust_decimal::Decimal;
    use serde_json::json;
    use skyhop_agent::planner::{Planner, PlannerAction, PlanningState, ScriptedPlanner};
    use skyhop_agent::runtime::{AgentRuntime, RuntimeSettings};
    use skyhop_agent::tools::{BookingTools, ToolDescriptor, ToolRegistry};
    use skyhop_core::config::AppConfig;
    use skyhop_core::ledger::BudgetLedger;

    use crate::bootstrap::build_state;
    use crate::test_support::{get, post_json, send};
    use crate::{router, AppState, ServiceInfo};

    const VALID_BOOKING: &str = r#"{
        "passenger_name": "John Doe",
        "max_price": 5000,
        "departure": "Delhi",
        "destination": "Mumbai",
        "booking_date": "25-11-2025"
    }"#;

    fn app_with_limit(limit: u32) -> Router {
        let mut config = AppConfig::default();
        config.budget.limit = Decimal::from(limit);
        router(build_state(&config).expect("state"))
    }

    struct BrokenPlanner;

    #[async_trait]
    impl Planner for BrokenPlanner {
        fn kind(&self) -> &'static str {
            "broken"
        }

        async fn next_action(
            &self,
            _state: &PlanningState<'_>,
            _tools: &[ToolDescriptor],
        ) -> Result<PlannerAction> {
            Err(anyhow!("model unavailable"))
        }
    }

    struct StalledPlanner;

    #[async_trait]
    impl Planner for StalledPlanner {
        fn kind(&self) -> &'static str {
            "stalled"
        }

        async fn next_action(
            &self,
            _state: &PlanningState<'_>,
            _tools: &[ToolDescriptor],
        ) -> Result<PlannerAction> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(PlannerAction::Done { summary: "late".to_string() })
        }
    }

    /// Follows the scripted plan until a booking exists, then loses the model.
    struct DropsAfterBookingPlanner;

    #[async_trait]
    impl Planner for DropsAfterBookingPlanner {
        fn kind(&self) -> &'static str {
            "drops-after-booking"
        }

        async fn next_action(
            &self,
            state: &PlanningState<'_>,
            tools: &[ToolDescriptor],
        ) -> Result<PlannerAction> {
            if state.steps.iter().any(|step| step.result.confirmation().is_some()) {
                return Err(anyhow!("model endpoint returned 500"));
            }
            ScriptedPlanner.next_action(state, tools).await
        }
    }

    fn app_with_planner(planner: Arc<dyn Planner>, planner_timeout: Duration) -> Router {
        app_with_planner_and_ledger(planner, planner_timeout, Arc::new(BudgetLedger::default()))
    }

    fn app_with_planner_and_ledger(
        planner: Arc<dyn Planner>,
        planner_timeout: Duration,
        ledger: Arc<BudgetLedger>,
    ) -> Router {
        let registry = ToolRegistry::booking(Arc::new(BookingTools::with_ledger(Arc::clone(&ledger))));
        let runtime = AgentRuntime::new(
            planner,
            registry,
            RuntimeSettings { max_iterations: 10, planner_timeout },
        );
        let info = ServiceInfo {
            environment: "test".to_string(),
            model: "gpt-4".to_string(),
            currency: "$".to_string(),
        };
        router(AppState::new(runtime, ledger, info))
    }

    #[tokio::test]
    async fn root_reports_running_service() {
        let (status, body) = send(&app_with_limit(1000), get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Agentic AI Autonomous Flight Booking API");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn agent_info_lists_tools_in_booking_order() {
        let (status, body) = send(&app_with_limit(1000), get("/api/v1/agent-info")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agent_type"], "Autonomous Flight Booking Agent");
        assert_eq!(body["planner"], "scripted");
        assert_eq!(body["max_iterations"], 10);
        let names = body["tools"]
            .as_array()
            .expect("tools")
            .iter()
            .map(|tool| tool["name"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["search_flights", "book_flight", "add_to_calendar"]);
    }

    #[tokio::test]
    async fn booking_is_confirmed_and_charged_to_the_ledger() {
        let app = app_with_limit(1000);

        let (status, body) = send(&app, post_json("/api/v1/book-flight", VALID_BOOKING)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmed");
        assert!(body["booking_id"].as_str().unwrap_or_default().starts_with("BK"));
        assert!(body["calendar_event_id"].as_str().unwrap_or_default().starts_with("CAL"));
        assert_eq!(body["agent_reasoning"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["flight_details"]["destination"], "Mumbai (BOM)");

        let (_, budget) = send(&app, get("/api/v1/budget")).await;
        let spent = body["flight_details"]["price"].as_u64().expect("price");
        assert_eq!(budget["total"], json!(spent.to_string()));
    }

    #[tokio::test]
    async fn booking_over_budget_is_blocked_with_ok_status() {
        let app = app_with_limit(200);

        let (status, body) = send(&app, post_json("/api/v1/book-flight", VALID_BOOKING)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "blocked");
        assert!(body["message"].as_str().unwrap_or_default().starts_with("BOOKING BLOCKED"));
        assert!(body.get("booking_id").is_none());

        let (_, budget) = send(&app, get("/api/v1/budget")).await;
        assert_eq!(budget["total"], json!("0"));
    }

    #[tokio::test]
    async fn missing_field_is_unprocessable_with_detail() {
        let body = r#"{ "passenger_name": "John Doe", "max_price": 5000, "destination": "Mumbai", "booking_date": "25-11-2025" }"#;

        let (status, payload) =
            send(&app_with_limit(1000), post_json("/api/v1/book-flight", body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(payload["detail"].as_str().unwrap_or_default().contains("departure"));
        assert!(payload["correlation_id"].as_str().unwrap_or_default().starts_with("req-"));
    }

    #[tokio::test]
    async fn malformed_json_and_bad_dates_are_unprocessable() {
        let app = app_with_limit(1000);

        let (status, _) = send(&app, post_json("/api/v1/book-flight", "{ not json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let bad_date = VALID_BOOKING.replace("25-11-2025", "2025/11/25");
        let (status, payload) = send(&app, post_json("/api/v1/book-flight", &bad_date)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(payload["detail"].as_str().unwrap_or_default().contains("booking_date"));

        let negative = VALID_BOOKING.replace("5000", "-5");
        let (status, _) = send(&app, post_json("/api/v1/book-flight", &negative)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn text_booking_runs_the_agent() {
        let body = json!({ "text": "Book Alice Smith from Delhi to Mumbai under 5000 on 25-11-2025" });

        let (status, payload) = send(
            &app_with_limit(1000),
            post_json("/api/v1/book-flight/text", &body.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "confirmed");
    }

    #[tokio::test]
    async fn incomplete_text_asks_for_clarification() {
        let body = json!({ "text": "Book flight FL421 for John Smith" });

        let (status, payload) = send(
            &app_with_limit(1000),
            post_json("/api/v1/book-flight/text", &body.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(payload["detail"].as_str().unwrap_or_default().contains("travel date"));
    }

    #[tokio::test]
    async fn planner_failure_maps_to_bad_gateway() {
        let app = app_with_planner(Arc::new(BrokenPlanner), Duration::from_secs(5));

        let (status, payload) = send(&app, post_json("/api/v1/book-flight", VALID_BOOKING)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(payload["detail"].as_str().unwrap_or_default().contains("model unavailable"));
        assert!(payload.get("booking_id").is_none());
        assert!(payload.get("agent_reasoning").is_none());
    }

    #[tokio::test]
    async fn planner_timeout_maps_to_gateway_timeout() {
        let app = app_with_planner(Arc::new(StalledPlanner), Duration::from_millis(20));

        let (status, _) = send(&app, post_json("/api/v1/book-flight", VALID_BOOKING)).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn failure_after_booking_returns_the_booking_reference() {
        let ledger = Arc::new(BudgetLedger::default());
        let app = app_with_planner_and_ledger(
            Arc::new(DropsAfterBookingPlanner),
            Duration::from_secs(5),
            Arc::clone(&ledger),
        );

        let (status, payload) = send(&app, post_json("/api/v1/book-flight", VALID_BOOKING)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(payload["detail"].as_str().unwrap_or_default().contains("500"));
        assert!(payload["booking_id"].as_str().unwrap_or_default().starts_with("BK"));
        assert_eq!(payload["pnr"].as_str().map(str::len), Some(6));
        let reasoning = payload["agent_reasoning"].as_array().expect("trace");
        assert_eq!(reasoning.len(), 2);
        assert!(reasoning[1].as_str().unwrap_or_default().starts_with("book_flight: booked"));
        assert!(ledger.total() > Decimal::ZERO);
    }
}
