use skyhop_agent::tools::{ToolResult, ToolStatus};

use crate::commands::{
    booking_tools, load_config, CommandResult, EXIT_BLOCKED, EXIT_INVALID_INPUT,
};

pub fn search(destination: &str, max_price: f64) -> CommandResult {
    match load_config() {
        Ok(config) => into_command("search", booking_tools(&config).search_flights(destination, max_price)),
        Err(error) => CommandResult::config_failure("search", &error),
    }
}

pub fn book(flight_id: &str, passenger_name: &str) -> CommandResult {
    match load_config() {
        Ok(config) => into_command("book", booking_tools(&config).book_flight(flight_id, passenger_name)),
        Err(error) => CommandResult::config_failure("book", &error),
    }
}

pub fn calendar(date: &str, details: &str) -> CommandResult {
    match load_config() {
        Ok(config) => into_command("calendar", booking_tools(&config).add_to_calendar(date, details)),
        Err(error) => CommandResult::config_failure("calendar", &error),
    }
}

fn into_command(command: &str, result: ToolResult) -> CommandResult {
    match result.status {
        ToolStatus::Success => CommandResult::success(command, result.message),
        ToolStatus::InvalidInput => {
            CommandResult::failure(command, "invalid_input", result.message, EXIT_INVALID_INPUT)
        }
        ToolStatus::Blocked => {
            CommandResult::failure(command, "budget_exceeded", result.message, EXIT_BLOCKED)
        }
    }
}
