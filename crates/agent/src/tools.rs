use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use skyhop_core::catalog::{DeterministicFarePricer, FarePricer, FlightCatalog};
use skyhop_core::domain::booking::{BookingConfirmation, CalendarEvent, HighStakesWarning};
use skyhop_core::domain::flight::{FlightOption, FlightQuery};
use skyhop_core::ledger::{BudgetLedger, BudgetRejection};
use skyhop_core::validation::{
    Departure, Destination, EventDetails, FlightId, PassengerName, Price, TravelDate,
    ValidationError,
};
use tracing::info;

use crate::guardrails::{ChargeIntent, GuardrailDecision, GuardrailPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    SearchFlights,
    BookFlight,
    AddToCalendar,
}

impl ToolName {
    /// Execution order of a complete booking.
    pub const ALL: [ToolName; 3] = [Self::SearchFlights, Self::BookFlight, Self::AddToCalendar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchFlights => "search_flights",
            Self::BookFlight => "book_flight",
            Self::AddToCalendar => "add_to_calendar",
        }
    }

    /// 1-based position in a complete booking.
    pub fn stage(&self) -> u8 {
        match self {
            Self::SearchFlights => 1,
            Self::BookFlight => 2,
            Self::AddToCalendar => 3,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == value.trim())
            .ok_or_else(|| format!("unknown tool `{}`", value.trim()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    InvalidInput,
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolPayload {
    Flights {
        options: Vec<FlightOption>,
    },
    Booking {
        confirmation: BookingConfirmation,
        warning: HighStakesWarning,
        total: Decimal,
        remaining: Decimal,
    },
    Blocked {
        warning: HighStakesWarning,
        reason_code: &'static str,
        fallback_path: &'static str,
        rejection: BudgetRejection,
    },
    Calendar {
        event: CalendarEvent,
    },
    Rejected {
        field: &'static str,
    },
}

/// Outcome of a single tool call. Every input, malformed or not, produces one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub tool: ToolName,
    pub status: ToolStatus,
    pub message: String,
    pub payload: ToolPayload,
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn flights(&self) -> Option<&[FlightOption]> {
        match &self.payload {
            ToolPayload::Flights { options } => Some(options),
            _ => None,
        }
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        match &self.payload {
            ToolPayload::Booking { confirmation, .. } => Some(confirmation),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&HighStakesWarning> {
        match &self.payload {
            ToolPayload::Booking { warning, .. } | ToolPayload::Blocked { warning, .. } => {
                Some(warning)
            }
            _ => None,
        }
    }

    pub fn calendar_event(&self) -> Option<&CalendarEvent> {
        match &self.payload {
            ToolPayload::Calendar { event } => Some(event),
            _ => None,
        }
    }

    /// Short outcome used in reasoning traces.
    pub fn summary(&self) -> String {
        match (&self.status, &self.payload) {
            (ToolStatus::Success, ToolPayload::Flights { options }) => {
                format!("found {} flight(s)", options.len())
            }
            (ToolStatus::Success, ToolPayload::Booking { confirmation, .. }) => format!(
                "booked {} as {} for {}",
                confirmation.flight_id, confirmation.booking_id, confirmation.price
            ),
            (ToolStatus::Success, ToolPayload::Calendar { event }) => {
                format!("added event {} on {}", event.event_id, event.date)
            }
            (ToolStatus::Blocked, ToolPayload::Blocked { reason_code, .. }) => {
                format!("blocked ({reason_code})")
            }
            (ToolStatus::InvalidInput, ToolPayload::Rejected { field }) => {
                format!("invalid input ({field})")
            }
            (status, _) => format!("{status:?}").to_ascii_lowercase(),
        }
    }
}

/// The three booking operations over a shared catalog and budget guardrail.
pub struct BookingTools<P = DeterministicFarePricer> {
    catalog: FlightCatalog<P>,
    guardrails: GuardrailPolicy,
}

impl BookingTools<DeterministicFarePricer> {
    pub fn with_ledger(ledger: Arc<BudgetLedger>) -> Self {
        Self::new(FlightCatalog::default(), GuardrailPolicy::new(ledger))
    }
}

impl<P> BookingTools<P>
where
    P: FarePricer,
{
    pub fn new(catalog: FlightCatalog<P>, guardrails: GuardrailPolicy) -> Self {
        Self { catalog, guardrails }
    }

    pub fn ledger(&self) -> &Arc<BudgetLedger> {
        self.guardrails.ledger()
    }

    pub fn currency(&self) -> &str {
        self.guardrails.currency()
    }

    pub fn search_flights(&self, destination: &str, max_price: f64) -> ToolResult {
        let query = Destination::parse(destination)
            .and_then(|destination| Ok(FlightQuery::new(destination, Price::from_f64(max_price)?)));
        match query {
            Ok(query) => self.search(&query),
            Err(error) => invalid(ToolName::SearchFlights, error),
        }
    }

    pub fn search(&self, query: &FlightQuery) -> ToolResult {
        let options = self.catalog.search(query);
        let currency = self.currency();
        let route = match &query.departure {
            Some(departure) => format!("from {departure} to {}", query.destination),
            None => format!("to {}", query.destination),
        };

        info!(
            event_name = "agent.tool.search_flights",
            destination = %query.destination,
            max_price = %query.max_price,
            found = options.len(),
            "flight search completed"
        );

        let message = if options.is_empty() {
            format!("No flights found {route} within budget of {currency}{}", query.max_price)
        } else {
            let lines = options
                .iter()
                .map(|option| format!("- {}", option.summary_line(currency)))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Found {} flights {route} under {currency}{}:\n{lines}",
                options.len(),
                query.max_price
            )
        };

        ToolResult {
            tool: ToolName::SearchFlights,
            status: ToolStatus::Success,
            message,
            payload: ToolPayload::Flights { options },
        }
    }

    pub fn book_flight(&self, flight_id: &str, passenger_name: &str) -> ToolResult {
        let parsed = FlightId::parse(flight_id)
            .and_then(|flight_id| Ok((flight_id, PassengerName::parse(passenger_name)?)));
        let (flight_id, passenger) = match parsed {
            Ok(parsed) => parsed,
            Err(error) => return invalid(ToolName::BookFlight, error),
        };

        let fare = self.catalog.fare_for(&flight_id);
        let charge = ChargeIntent::new(flight_id.clone(), passenger.clone(), fare);
        let warning = self.guardrails.announce(&charge);
        let currency = self.currency();

        match self.guardrails.evaluate(&charge) {
            GuardrailDecision::Allow { total, remaining } => {
                let confirmation = BookingConfirmation::issue(flight_id, passenger, fare);
                info!(
                    event_name = "agent.tool.book_flight",
                    booking_id = %confirmation.booking_id,
                    flight_id = %confirmation.flight_id,
                    price = fare,
                    remaining = %remaining,
                    "flight booked"
                );
                let message = format!(
                    "{}\nBOOKING CONFIRMED\nBooking ID: {}\nPNR: {}\nFlight: {}\nPassenger: {}\nAmount Charged: {currency}{fare}\nTotal Spending: {currency}{total} / {currency}{}\nRemaining Budget: {currency}{remaining}",
                    warning.render(currency),
                    confirmation.booking_id,
                    confirmation.pnr,
                    confirmation.flight_id,
                    confirmation.passenger_name,
                    self.ledger().limit(),
                );
                ToolResult {
                    tool: ToolName::BookFlight,
                    status: ToolStatus::Success,
                    message,
                    payload: ToolPayload::Booking { confirmation, warning, total, remaining },
                }
            }
            GuardrailDecision::Deny { reason_code, user_message, fallback_path, rejection } => {
                ToolResult {
                    tool: ToolName::BookFlight,
                    status: ToolStatus::Blocked,
                    message: user_message,
                    payload: ToolPayload::Blocked { warning, reason_code, fallback_path, rejection },
                }
            }
        }
    }

    /// Requires the canonical `YYYY-MM-DD` date.
    pub fn add_to_calendar(&self, date: &str, details: &str) -> ToolResult {
        let parsed = TravelDate::parse_canonical(date)
            .and_then(|date| Ok((date, EventDetails::parse(details)?)));
        let (date, details) = match parsed {
            Ok(parsed) => parsed,
            Err(error) => return invalid(ToolName::AddToCalendar, error),
        };

        let event = CalendarEvent::schedule(date, details);
        info!(
            event_name = "agent.tool.add_to_calendar",
            event_id = %event.event_id,
            date = %event.date,
            "calendar event created"
        );

        ToolResult {
            tool: ToolName::AddToCalendar,
            status: ToolStatus::Success,
            message: format!(
                "Calendar Event Created\nEvent ID: {}\nDate: {}\nDetails: {}\nReminder: {}\nStatus: Successfully added to calendar",
                event.event_id, event.date, event.details, event.reminder
            ),
            payload: ToolPayload::Calendar { event },
        }
    }
}

fn invalid(tool: ToolName, error: ValidationError) -> ToolResult {
    let label = match tool {
        ToolName::SearchFlights => "Search",
        ToolName::BookFlight => "Booking",
        ToolName::AddToCalendar => "Calendar",
    };
    info!(
        event_name = "agent.tool.invalid_input",
        tool = tool.as_str(),
        field = error.field(),
        "tool input rejected"
    );
    ToolResult {
        tool,
        status: ToolStatus::InvalidInput,
        message: format!("{label} error: Invalid input - {error}"),
        payload: ToolPayload::Rejected { field: error.field() },
    }
}

/// What a planner is told about a tool.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;
    fn descriptor(&self) -> ToolDescriptor;
    async fn execute(&self, input: Value) -> ToolResult;
}

pub struct SearchFlightsTool<P = DeterministicFarePricer> {
    tools: Arc<BookingTools<P>>,
}

pub struct BookFlightTool<P = DeterministicFarePricer> {
    tools: Arc<BookingTools<P>>,
}

pub struct AddToCalendarTool<P = DeterministicFarePricer> {
    tools: Arc<BookingTools<P>>,
}

#[async_trait]
impl<P> Tool for SearchFlightsTool<P>
where
    P: FarePricer + 'static,
{
    fn name(&self) -> ToolName {
        ToolName::SearchFlights
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: "Search for available flights to a destination within a maximum price. Returns flight numbers, airlines, times and prices.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "destination": { "type": "string", "description": "Destination city or airport code" },
                    "max_price": { "type": "number", "description": "Maximum price for the flight" },
                    "departure": { "type": "string", "description": "Departure city" },
                    "date": { "type": "string", "description": "Travel date, YYYY-MM-DD or DD-MM-YYYY" }
                },
                "required": ["destination", "max_price"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let query = (|| -> Result<FlightQuery, ValidationError> {
            let destination = Destination::parse(&text_argument(&input, "destination"))?;
            let max_price = Price::from_json(input.get("max_price"))?;
            let mut query = FlightQuery::new(destination, max_price);
            if let Some(departure) = optional_text_argument(&input, "departure") {
                query = query.from_departure(Departure::parse(&departure)?);
            }
            if let Some(date) = optional_text_argument(&input, "date") {
                query = query.on(TravelDate::parse_flexible(TravelDate::FIELD, &date)?);
            }
            Ok(query)
        })();

        match query {
            Ok(query) => self.tools.search(&query),
            Err(error) => invalid(ToolName::SearchFlights, error),
        }
    }
}

#[async_trait]
impl<P> Tool for BookFlightTool<P>
where
    P: FarePricer + 'static,
{
    fn name(&self) -> ToolName {
        ToolName::BookFlight
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: "Book a specific flight by ID. HIGH-STAKES: this charges money and is checked against the remaining budget. Only book a flight returned by search_flights.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "flight_id": { "type": "string", "description": "Flight number to book" },
                    "passenger_name": { "type": "string", "description": "Passenger name for the booking" }
                },
                "required": ["flight_id", "passenger_name"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> ToolResult {
        self.tools.book_flight(
            &text_argument(&input, "flight_id"),
            &text_argument(&input, "passenger_name"),
        )
    }
}

#[async_trait]
impl<P> Tool for AddToCalendarTool<P>
where
    P: FarePricer + 'static,
{
    fn name(&self) -> ToolName {
        ToolName::AddToCalendar
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: "Add a booked flight to the calendar. Use after a successful booking. Requires the date in YYYY-MM-DD format and event details.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "date": { "type": "string", "description": "Flight date in YYYY-MM-DD format" },
                    "details": { "type": "string", "description": "Flight details for the event" }
                },
                "required": ["date", "details"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> ToolResult {
        self.tools
            .add_to_calendar(&text_argument(&input, "date"), &text_argument(&input, "details"))
    }
}

// Missing arguments become empty text so the validator reports them.
fn text_argument(input: &Value, key: &str) -> String {
    match input.get(key) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn optional_text_argument(input: &Value, key: &str) -> Option<String> {
    Some(text_argument(input, key)).filter(|value| !value.trim().is_empty())
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<ToolName, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry holding the three booking tools over one shared façade.
    pub fn booking<P>(tools: Arc<BookingTools<P>>) -> Self
    where
        P: FarePricer + 'static,
    {
        let mut registry = Self::default();
        registry.register(SearchFlightsTool { tools: Arc::clone(&tools) });
        registry.register(BookFlightTool { tools: Arc::clone(&tools) });
        registry.register(AddToCalendarTool { tools });
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name(), Box::new(tool));
    }

    pub fn get(&self, name: ToolName) -> Option<&dyn Tool> {
        self.tools.get(&name).map(|tool| tool.as_ref())
    }

    /// Descriptors in booking order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        ToolName::ALL.iter().filter_map(|name| self.get(*name)).map(|tool| tool.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
