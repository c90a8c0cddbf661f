use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use skyhop_core::domain::booking::{BookingRequest, HighStakesWarning};
use skyhop_core::domain::flight::FlightOption;
use skyhop_core::errors::ApplicationError;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::planner::{Planner, PlannerAction, PlanningState, StepRecord};
use crate::tools::{ToolName, ToolRegistry, ToolResult, ToolStatus};

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;
pub const DEFAULT_PLANNER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub max_iterations: u32,
    pub planner_timeout: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self { max_iterations: DEFAULT_MAX_ITERATIONS, planner_timeout: DEFAULT_PLANNER_TIMEOUT }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("planner failed: {0}")]
    Planner(String),
    #[error("planner did not answer within {seconds}s")]
    Timeout { seconds: u64 },
    #[error("plan violation: {0}")]
    PlanViolation(String),
    #[error("no decision after {0} planning iterations")]
    IterationLimit(u32),
}

/// A failed run together with whatever it got done before failing.
///
/// A booking made before the failure stays charged to the ledger, so its
/// reference travels with the error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{error}")]
pub struct OrchestratorFailure {
    pub error: OrchestratorError,
    pub trace: Vec<String>,
    pub booking_id: Option<String>,
    pub pnr: Option<String>,
}

impl From<OrchestratorError> for ApplicationError {
    fn from(value: OrchestratorError) -> Self {
        match value {
            OrchestratorError::Timeout { seconds } => Self::OrchestratorTimeout(seconds),
            other => Self::Orchestrator(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Booked and added to the calendar.
    Confirmed,
    /// Booked, but the planner stopped before the calendar step.
    Booked,
    NoFlights,
    Blocked,
    InvalidInput,
    /// The planner finished without booking anything.
    Incomplete,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Booked => "booked",
            Self::NoFlights => "no_flights",
            Self::Blocked => "blocked",
            Self::InvalidInput => "invalid_input",
            Self::Incomplete => "incomplete",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentOutcome {
    pub status: BookingStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_details: Option<FlightOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<HighStakesWarning>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "agent_reasoning")]
    pub trace: Vec<String>,
}

pub struct AgentRuntime {
    planner: Arc<dyn Planner>,
    tools: ToolRegistry,
    settings: RuntimeSettings,
}

impl AgentRuntime {
    pub fn new(planner: Arc<dyn Planner>, tools: ToolRegistry, settings: RuntimeSettings) -> Self {
        Self { planner, tools, settings }
    }

    pub fn planner_kind(&self) -> &'static str {
        self.planner.kind()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn settings(&self) -> RuntimeSettings {
        self.settings
    }

    /// Drives the planner until it finishes, a tool refuses, or a limit is hit.
    pub async fn handle_booking(
        &self,
        request: &BookingRequest,
        correlation_id: &str,
    ) -> Result<AgentOutcome, OrchestratorFailure> {
        let descriptors = self.tools.descriptors();
        let mut steps: Vec<StepRecord> = Vec::new();

        info!(
            event_name = "agent.run.started",
            correlation_id,
            planner = self.planner.kind(),
            passenger = %request.passenger_name,
            destination = %request.destination,
            "booking run started"
        );

        for iteration in 1..=self.settings.max_iterations {
            let state = PlanningState { request, steps: &steps };
            let action =
                match timeout(self.settings.planner_timeout, self.planner.next_action(&state, &descriptors))
                    .await
                {
                    Ok(Ok(action)) => action,
                    Ok(Err(error)) => {
                        return Err(self.fail(
                            correlation_id,
                            OrchestratorError::Planner(format!("{error:#}")),
                            &steps,
                        ))
                    }
                    Err(_) => {
                        return Err(self.fail(
                            correlation_id,
                            OrchestratorError::Timeout {
                                seconds: self.settings.planner_timeout.as_secs().max(1),
                            },
                            &steps,
                        ))
                    }
                };

            match action {
                PlannerAction::Invoke { tool, arguments } => {
                    let name = match tool.parse::<ToolName>() {
                        Ok(name) => name,
                        Err(error) => {
                            return Err(self.fail(
                                correlation_id,
                                OrchestratorError::PlanViolation(error),
                                &steps,
                            ))
                        }
                    };
                    let checked = check_order(name, &steps)
                        .and_then(|()| check_booking_choice(name, &arguments, request, &steps));
                    if let Err(error) = checked {
                        return Err(self.fail(correlation_id, error, &steps));
                    }

                    let Some(handler) = self.tools.get(name) else {
                        return Err(self.fail(
                            correlation_id,
                            OrchestratorError::PlanViolation(format!("tool `{name}` is not registered")),
                            &steps,
                        ));
                    };
                    let result = handler.execute(arguments.clone()).await;

                    info!(
                        event_name = "agent.tool.invoked",
                        correlation_id,
                        iteration,
                        tool = name.as_str(),
                        status = ?result.status,
                        "tool invoked"
                    );

                    let halted = result.status != ToolStatus::Success;
                    steps.push(StepRecord { tool: name, arguments, result });
                    if halted {
                        return Ok(halted_outcome(&steps));
                    }
                }
                PlannerAction::Done { summary } => {
                    let outcome = completed_outcome(&steps, summary);
                    info!(
                        event_name = "agent.run.completed",
                        correlation_id,
                        status = ?outcome.status,
                        booking_id = outcome.booking_id.as_deref().unwrap_or("-"),
                        "booking run completed"
                    );
                    return Ok(outcome);
                }
                PlannerAction::Failed { reason } => {
                    return Err(self.fail(correlation_id, OrchestratorError::Planner(reason), &steps));
                }
            }
        }

        Err(self.fail(
            correlation_id,
            OrchestratorError::IterationLimit(self.settings.max_iterations),
            &steps,
        ))
    }

    fn fail(
        &self,
        correlation_id: &str,
        error: OrchestratorError,
        steps: &[StepRecord],
    ) -> OrchestratorFailure {
        let confirmation =
            latest_success(steps, ToolName::BookFlight).and_then(ToolResult::confirmation);
        warn!(
            event_name = "agent.run.failed",
            correlation_id,
            planner = self.planner.kind(),
            error = %error,
            steps = steps.len(),
            booking_id = confirmation.map_or("-", |confirmation| confirmation.booking_id.as_str()),
            "booking run failed"
        );
        OrchestratorFailure {
            error,
            trace: trace(steps),
            booking_id: confirmation.map(|confirmation| confirmation.booking_id.clone()),
            pnr: confirmation.map(|confirmation| confirmation.pnr.clone()),
        }
    }
}

// search may repeat until a booking exists; book and calendar run once each, in order
fn check_order(proposed: ToolName, steps: &[StepRecord]) -> Result<(), OrchestratorError> {
    let reached = steps
        .iter()
        .filter(|step| step.result.status == ToolStatus::Success)
        .map(|step| step.tool.stage())
        .max()
        .unwrap_or(0);

    let allowed = proposed.stage() == reached + 1
        || (proposed == ToolName::SearchFlights && reached == ToolName::SearchFlights.stage());
    if allowed {
        return Ok(());
    }

    let expected = ToolName::ALL
        .iter()
        .find(|tool| tool.stage() == reached + 1)
        .map(|tool| tool.as_str())
        .unwrap_or("nothing further");
    Err(OrchestratorError::PlanViolation(format!(
        "`{proposed}` proposed out of order, expected {expected}"
    )))
}

// a booking must name a flight some search returned, priced within the request
fn check_booking_choice(
    proposed: ToolName,
    arguments: &Value,
    request: &BookingRequest,
    steps: &[StepRecord],
) -> Result<(), OrchestratorError> {
    if proposed != ToolName::BookFlight {
        return Ok(());
    }
    let Some(flight_id) = arguments.get("flight_id").and_then(Value::as_str) else {
        // the tool reports missing arguments itself
        return Ok(());
    };

    let searched = steps
        .iter()
        .filter_map(|step| step.result.flights())
        .flatten()
        .find(|option| option.flight_number.eq_ignore_ascii_case(flight_id.trim()));
    match searched {
        None => Err(OrchestratorError::PlanViolation(format!(
            "`book_flight` proposed for {flight_id}, which no search returned"
        ))),
        Some(option) if !request.max_price.covers(option.price) => {
            Err(OrchestratorError::PlanViolation(format!(
                "`book_flight` proposed for {flight_id} at {}, above the requested maximum of {}",
                option.price, request.max_price
            )))
        }
        Some(_) => Ok(()),
    }
}

fn latest_success(steps: &[StepRecord], tool: ToolName) -> Option<&ToolResult> {
    steps
        .iter()
        .rev()
        .find(|step| step.tool == tool && step.result.status == ToolStatus::Success)
        .map(|step| &step.result)
}

fn trace(steps: &[StepRecord]) -> Vec<String> {
    steps.iter().map(|step| format!("{}: {}", step.tool, step.result.summary())).collect()
}

fn halted_outcome(steps: &[StepRecord]) -> AgentOutcome {
    let mut outcome = completed_outcome(steps, String::new());
    if let Some(last) = steps.last() {
        outcome.status = match last.result.status {
            ToolStatus::Blocked => BookingStatus::Blocked,
            _ => BookingStatus::InvalidInput,
        };
        outcome.message = last.result.message.clone();
        if outcome.warning.is_none() {
            outcome.warning = last.result.warning().cloned();
        }
    }
    outcome
}

fn completed_outcome(steps: &[StepRecord], summary: String) -> AgentOutcome {
    let search = latest_success(steps, ToolName::SearchFlights);
    let booking = latest_success(steps, ToolName::BookFlight);
    let confirmation = booking.and_then(ToolResult::confirmation);
    let calendar_event = latest_success(steps, ToolName::AddToCalendar).and_then(ToolResult::calendar_event);

    let status = match (confirmation, calendar_event, search) {
        (Some(_), Some(_), _) => BookingStatus::Confirmed,
        (Some(_), None, _) => BookingStatus::Booked,
        (None, _, Some(search)) if search.flights().is_some_and(<[_]>::is_empty) => {
            BookingStatus::NoFlights
        }
        _ => BookingStatus::Incomplete,
    };

    let flight_details = confirmation.and_then(|confirmation| {
        steps
            .iter()
            .filter_map(|step| step.result.flights())
            .flatten()
            .find(|option| option.flight_number.eq_ignore_ascii_case(confirmation.flight_id.as_str()))
            .cloned()
            .map(|mut option| {
                option.price = confirmation.price;
                option
            })
    });

    AgentOutcome {
        status,
        message: summary,
        booking_id: confirmation.map(|confirmation| confirmation.booking_id.clone()),
        pnr: confirmation.map(|confirmation| confirmation.pnr.clone()),
        flight_details,
        calendar_event_id: calendar_event.map(|event| event.event_id.clone()),
        warning: booking.and_then(ToolResult::warning).cloned(),
        timestamp: Utc::now(),
        trace: trace(steps),
    }
}
