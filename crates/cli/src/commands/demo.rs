use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use skyhop_agent::planner::ScriptedPlanner;
use skyhop_agent::runtime::{AgentRuntime, RuntimeSettings};
use skyhop_agent::tools::{ToolName, ToolRegistry};
use skyhop_core::config::AppConfig;
use skyhop_core::domain::booking::RawBookingRequest;

use crate::commands::{booking_tools, load_config, CommandResult, EXIT_AGENT};

pub const DEMO_QUERIES: [&str; 3] = [
    "Search for flights to New York under $600",
    "Book flight FL421 for John Smith",
    "Add the booking to my calendar for 2024-12-15 with details 'Flight to NYC'",
];

pub fn run() -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("demo", &error),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "demo",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_AGENT,
            );
        }
    };

    runtime.block_on(run_demo(&config))
}

fn demo_steps() -> [(&'static str, ToolName, Value); 3] {
    [
        (
            DEMO_QUERIES[0],
            ToolName::SearchFlights,
            json!({ "destination": "New York", "max_price": 600 }),
        ),
        (
            DEMO_QUERIES[1],
            ToolName::BookFlight,
            json!({ "flight_id": "FL421", "passenger_name": "John Smith" }),
        ),
        (
            DEMO_QUERIES[2],
            ToolName::AddToCalendar,
            json!({ "date": "2024-12-15", "details": "Flight to NYC" }),
        ),
    ]
}

fn sample_request() -> RawBookingRequest {
    RawBookingRequest {
        passenger_name: Some("John Doe".to_string()),
        max_price: Some(json!(5000)),
        departure: Some("Delhi".to_string()),
        destination: Some("Mumbai".to_string()),
        booking_date: Some("25-11-2025".to_string()),
    }
}

// Always scripted: the demo must run offline and produce the same steps each time.
async fn run_demo(config: &AppConfig) -> CommandResult {
    let tools = Arc::new(booking_tools(config));
    let registry = ToolRegistry::booking(Arc::clone(&tools));
    let currency = config.budget.currency.as_str();
    let mut lines = Vec::new();

    for (index, (query, name, arguments)) in demo_steps().into_iter().enumerate() {
        let Some(tool) = registry.get(name) else {
            return CommandResult::failure(
                "demo",
                "agent",
                format!("tool `{name}` is not registered"),
                EXIT_AGENT,
            );
        };
        let result = tool.execute(arguments).await;
        lines.push(format!("Query {}: {query}", index + 1));
        lines.push(result.message);
        lines.push(String::new());
    }

    let request = match sample_request().validate() {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure("demo", "invalid_input", error.to_string(), EXIT_AGENT)
        }
    };
    let agent = AgentRuntime::new(
        Arc::new(ScriptedPlanner),
        registry,
        RuntimeSettings {
            max_iterations: config.llm.max_iterations,
            planner_timeout: Duration::from_secs(config.llm.timeout_secs),
        },
    );

    lines.push(format!(
        "Agent run: {} from {} to {} under {currency}{}",
        request.passenger_name, request.departure, request.destination, request.max_price
    ));
    match agent.handle_booking(&request, "demo").await {
        Ok(outcome) => {
            lines.push(format!("Status: {}", outcome.status.as_str()));
            lines.extend(outcome.trace.iter().map(|step| format!("- {step}")));
        }
        Err(error) => {
            return CommandResult::failure("demo", "agent", error.to_string(), EXIT_AGENT);
        }
    }

    let snapshot = tools.ledger().snapshot();
    lines.push(String::new());
    lines.push(format!(
        "Final budget status: {currency}{} / {currency}{}",
        snapshot.total, snapshot.limit
    ));

    CommandResult::success("demo", lines.join("\n"))
}
