//! Planning seam between the agent runtime and whatever decides the next step.
//!
//! A planner only proposes actions. The runtime validates every proposal
//! against the booking order and runs the tools itself, so a planner can
//! never charge the budget directly.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skyhop_core::domain::booking::BookingRequest;

use crate::llm::LlmClient;
use crate::tools::{ToolDescriptor, ToolName, ToolResult, ToolStatus};

/// One executed tool call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub tool: ToolName,
    pub arguments: Value,
    pub result: ToolResult,
}

#[derive(Clone, Copy, Debug)]
pub struct PlanningState<'a> {
    pub request: &'a BookingRequest,
    pub steps: &'a [StepRecord],
}

impl PlanningState<'_> {
    fn succeeded(&self, tool: ToolName) -> Option<&ToolResult> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.tool == tool && step.result.status == ToolStatus::Success)
            .map(|step| &step.result)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannerAction {
    Invoke {
        tool: String,
        #[serde(default)]
        arguments: Value,
    },
    Done {
        summary: String,
    },
    Failed {
        reason: String,
    },
}

impl PlannerAction {
    pub fn invoke(tool: ToolName, arguments: Value) -> Self {
        Self::Invoke { tool: tool.as_str().to_string(), arguments }
    }
}

#[async_trait]
pub trait Planner: Send + Sync {
    /// Short label reported by the agent-info endpoint.
    fn kind(&self) -> &'static str;

    async fn next_action(
        &self,
        state: &PlanningState<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<PlannerAction>;
}

/// Deterministic search, book cheapest, add to calendar.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedPlanner;

#[async_trait]
impl Planner for ScriptedPlanner {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    async fn next_action(
        &self,
        state: &PlanningState<'_>,
        _tools: &[ToolDescriptor],
    ) -> Result<PlannerAction> {
        let request = state.request;

        let Some(search) = state.succeeded(ToolName::SearchFlights) else {
            return Ok(PlannerAction::invoke(
                ToolName::SearchFlights,
                json!({
                    "destination": request.destination.as_str(),
                    "max_price": request.max_price.to_string(),
                    "departure": request.departure.as_str(),
                    "date": request.travel_date.to_string(),
                }),
            ));
        };

        let Some(booking) = state.succeeded(ToolName::BookFlight) else {
            let Some(cheapest) = search.flights().and_then(|options| options.first()) else {
                return Ok(PlannerAction::Done {
                    summary: format!(
                        "No flights from {} to {} fit the budget of {}.",
                        request.departure, request.destination, request.max_price
                    ),
                });
            };
            return Ok(PlannerAction::invoke(
                ToolName::BookFlight,
                json!({
                    "flight_id": cheapest.flight_number,
                    "passenger_name": request.passenger_name.as_str(),
                }),
            ));
        };

        let confirmation =
            booking.confirmation().ok_or_else(|| anyhow!("booking step has no confirmation"))?;

        let Some(calendar) = state.succeeded(ToolName::AddToCalendar) else {
            return Ok(PlannerAction::invoke(
                ToolName::AddToCalendar,
                json!({
                    "date": request.travel_date.to_string(),
                    "details": format!(
                        "Flight {} from {} to {} for {} (booking {}, PNR {})",
                        confirmation.flight_id,
                        request.departure,
                        request.destination,
                        confirmation.passenger_name,
                        confirmation.booking_id,
                        confirmation.pnr
                    ),
                }),
            ));
        };

        let event_id = calendar.calendar_event().map(|event| event.event_id.as_str()).unwrap_or("-");
        Ok(PlannerAction::Done {
            summary: format!(
                "Flight {} booked for {} (booking {}, PNR {}) and added to the calendar as {}.",
                confirmation.flight_id,
                confirmation.passenger_name,
                confirmation.booking_id,
                confirmation.pnr,
                event_id
            ),
        })
    }
}

/// Asks a chat model for the next action as a JSON object.
pub struct LlmPlanner<C> {
    client: C,
}

impl<C> LlmPlanner<C>
where
    C: LlmClient,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn prompt(state: &PlanningState<'_>, tools: &[ToolDescriptor]) -> String {
        let request = state.request;
        let tool_lines = tools
            .iter()
            .map(|tool| format!("- {}: {} Parameters: {}", tool.name, tool.description, tool.parameters))
            .collect::<Vec<_>>()
            .join("\n");
        let history = if state.steps.is_empty() {
            "(none yet)".to_string()
        } else {
            state
                .steps
                .iter()
                .map(|step| format!("- {} {} -> {}", step.tool, step.arguments, step.result.message))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "Booking request:\n- Passenger Name: {}\n- Maximum Price: {}\n- Departure: {}\n- Destination: {}\n- Travel Date: {}\n\n\
Tools (use them in this order: search_flights, book_flight, add_to_calendar):\n{tool_lines}\n\n\
Steps taken so far:\n{history}\n\n\
Reply with one JSON object:\n\
{{\"action\":\"invoke\",\"tool\":\"<tool name>\",\"arguments\":{{...}}}}\n\
{{\"action\":\"done\",\"summary\":\"<what was achieved>\"}}\n\
{{\"action\":\"failed\",\"reason\":\"<why the booking cannot proceed>\"}}",
            request.passenger_name,
            request.max_price,
            request.departure,
            request.destination,
            request.travel_date,
        )
    }
}

#[async_trait]
impl<C> Planner for LlmPlanner<C>
where
    C: LlmClient,
{
    fn kind(&self) -> &'static str {
        "llm"
    }

    async fn next_action(
        &self,
        state: &PlanningState<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<PlannerAction> {
        let reply = self.client.complete(&Self::prompt(state, tools)).await?;
        parse_action(&reply)
    }
}

/// Reads the first JSON object out of a model reply, tolerating code fences
/// and surrounding prose.
pub fn parse_action(reply: &str) -> Result<PlannerAction> {
    let start = reply.find('{').ok_or_else(|| anyhow!("planner reply contained no JSON object"))?;
    let end = reply.rfind('}').filter(|end| *end > start).ok_or_else(|| {
        anyhow!("planner reply contained an unterminated JSON object")
    })?;

    serde_json::from_str::<PlannerAction>(&reply[start..=end])
        .with_context(|| format!("planner reply is not a valid action: {}", &reply[start..=end]))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use skyhop_core::domain::booking::{BookingConfirmation, BookingRequest, RawBookingRequest};
    use skyhop_core::domain::flight::FlightOption;
    use skyhop_core::validation::{FlightId, PassengerName};

    use super::{parse_action, LlmPlanner, Planner, PlannerAction, PlanningState, ScriptedPlanner, StepRecord};
    use crate::llm::LlmClient;
    use crate::tools::{ToolName, ToolPayload, ToolResult, ToolStatus};

    fn request() -> BookingRequest {
        RawBookingRequest {
            passenger_name: Some("Alice Smith".to_string()),
            max_price: Some(json!(600)),
            departure: Some("Delhi".to_string()),
            destination: Some("Mumbai".to_string()),
            booking_date: Some("25-11-2025".to_string()),
        }
        .validate()
        .expect("valid request")
    }

    fn search_step(options: Vec<FlightOption>) -> StepRecord {
        StepRecord {
            tool: ToolName::SearchFlights,
            arguments: json!({}),
            result: ToolResult {
                tool: ToolName::SearchFlights,
                status: ToolStatus::Success,
                message: String::new(),
                payload: ToolPayload::Flights { options },
            },
        }
    }

    fn option(flight_number: &str, price: u32) -> FlightOption {
        FlightOption {
            flight_number: flight_number.to_string(),
            airline: "IndiGo".to_string(),
            departure: None,
            destination: "Mumbai (BOM)".to_string(),
            departure_time: "10:00".to_string(),
            arrival_time: "12:25".to_string(),
            price,
            duration: "2h 25m".to_string(),
            date: None,
        }
    }

    #[tokio::test]
    async fn scripted_planner_walks_search_book_calendar() {
        let request = request();
        let planner = ScriptedPlanner;

        let first = planner
            .next_action(&PlanningState { request: &request, steps: &[] }, &[])
            .await
            .expect("first action");
        assert!(matches!(
            first,
            PlannerAction::Invoke { ref tool, ref arguments }
                if tool == "search_flights" && arguments["date"] == "2025-11-25"
        ));

        let steps = vec![search_step(vec![option("6E321", 410), option("SG555", 480)])];
        let second = planner
            .next_action(&PlanningState { request: &request, steps: &steps }, &[])
            .await
            .expect("second action");
        assert_eq!(
            second,
            PlannerAction::invoke(
                ToolName::BookFlight,
                json!({ "flight_id": "6E321", "passenger_name": "Alice Smith" })
            )
        );

        let mut steps = steps;
        steps.push(StepRecord {
            tool: ToolName::BookFlight,
            arguments: json!({}),
            result: ToolResult {
                tool: ToolName::BookFlight,
                status: ToolStatus::Success,
                message: String::new(),
                payload: ToolPayload::Booking {
                    confirmation: BookingConfirmation {
                        booking_id: "BK000001".to_string(),
                        pnr: "ABC123".to_string(),
                        flight_id: FlightId::parse("6E321").expect("id"),
                        passenger_name: PassengerName::parse("Alice Smith").expect("name"),
                        price: 410,
                        booked_at: Utc::now(),
                    },
                    warning: skyhop_core::domain::booking::HighStakesWarning::new(
                        FlightId::parse("6E321").expect("id"),
                        PassengerName::parse("Alice Smith").expect("name"),
                        410,
                    ),
                    total: 410.into(),
                    remaining: 590.into(),
                },
            },
        });
        let third = planner
            .next_action(&PlanningState { request: &request, steps: &steps }, &[])
            .await
            .expect("third action");
        assert!(matches!(
            third,
            PlannerAction::Invoke { ref tool, ref arguments }
                if tool == "add_to_calendar" && arguments["date"] == "2025-11-25"
        ));
    }

    #[tokio::test]
    async fn scripted_planner_finishes_when_nothing_fits() {
        let request = request();
        let steps = vec![search_step(Vec::new())];
        let action = ScriptedPlanner
            .next_action(&PlanningState { request: &request, steps: &steps }, &[])
            .await
            .expect("action");
        assert!(matches!(action, PlannerAction::Done { ref summary } if summary.starts_with("No flights")));
    }

    #[test]
    fn parse_action_tolerates_fences_and_prose() {
        let reply = "Sure!\n```json\n{\"action\":\"invoke\",\"tool\":\"book_flight\",\"arguments\":{\"flight_id\":\"AI101\"}}\n```";
        let action = parse_action(reply).expect("action");
        assert_eq!(
            action,
            PlannerAction::Invoke { tool: "book_flight".to_string(), arguments: json!({ "flight_id": "AI101" }) }
        );
    }

    #[test]
    fn parse_action_rejects_garbage() {
        assert!(parse_action("I would rather not").is_err());
        assert!(parse_action("{\"action\":\"teleport\"}").is_err());
    }

    struct RecordingClient {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for RecordingClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn llm_planner_prompts_with_request_and_parses_reply() {
        let client = RecordingClient {
            reply: "{\"action\":\"done\",\"summary\":\"all set\"}".to_string(),
            prompts: Mutex::new(Vec::new()),
        };
        let planner = LlmPlanner::new(client);
        let request = request();

        let action = planner
            .next_action(&PlanningState { request: &request, steps: &[] }, &[])
            .await
            .expect("action");
        assert_eq!(action, PlannerAction::Done { summary: "all set".to_string() });

        let prompts = planner.client.prompts.lock().expect("prompts");
        assert!(prompts[0].contains("Passenger Name: Alice Smith"));
        assert!(prompts[0].contains("Travel Date: 2025-11-25"));
    }
}
