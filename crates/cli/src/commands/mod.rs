pub mod config;
pub mod demo;
pub mod doctor;
pub mod tools;

use std::sync::Arc;

use serde::Serialize;
use skyhop_agent::guardrails::GuardrailPolicy;
use skyhop_agent::tools::BookingTools;
use skyhop_core::catalog::{DeterministicFarePricer, FlightCatalog};
use skyhop_core::config::{AppConfig, ConfigError, LoadOptions};
use skyhop_core::ledger::BudgetLedger;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_BLOCKED: u8 = 4;
pub const EXIT_AGENT: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        Self::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads configuration the same way the server does.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::load(LoadOptions::default())
}

/// Tool façade over a fresh ledger; each CLI invocation starts from zero spend.
pub fn booking_tools(config: &AppConfig) -> BookingTools {
    let ledger = Arc::new(BudgetLedger::new(config.budget.limit));
    let catalog =
        FlightCatalog::new(DeterministicFarePricer, config.catalog.max_results, config.catalog.mode);
    let guardrails = GuardrailPolicy::new(ledger).with_currency(config.budget.currency.clone());
    BookingTools::new(catalog, guardrails)
}
