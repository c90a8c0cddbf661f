use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use skyhop_cli::commands::{config, demo, doctor, tools};

#[test]
fn search_lists_flights_within_the_price() {
    with_env(&[], || {
        let result = tools::search("Mumbai", 700.0);
        assert_eq!(result.exit_code, 0, "expected successful search");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "search");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(
            message.starts_with("Found") || message.starts_with("No flights found"),
            "unexpected search message: {message}"
        );
    });
}

#[test]
fn search_rejects_negative_price() {
    with_env(&[], || {
        let result = tools::search("Mumbai", -5.0);
        assert_eq!(result.exit_code, 3, "expected invalid input code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
        assert!(payload["message"].as_str().unwrap_or_default().starts_with("Search error"));
    });
}

#[test]
fn book_confirms_within_budget() {
    with_env(&[], || {
        let result = tools::book("FL421", "John Smith");
        assert_eq!(result.exit_code, 0, "expected confirmed booking");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "book");
        assert!(payload["message"].as_str().unwrap_or_default().contains("BOOKING CONFIRMED"));
    });
}

#[test]
fn book_is_blocked_when_budget_is_too_small() {
    with_env(&[("SKYHOP_BUDGET_LIMIT", "100")], || {
        let result = tools::book("FL421", "John Smith");
        assert_eq!(result.exit_code, 4, "expected budget block code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "budget_exceeded");
        assert!(payload["message"].as_str().unwrap_or_default().starts_with("BOOKING BLOCKED"));
    });
}

#[test]
fn calendar_requires_canonical_dates() {
    with_env(&[], || {
        let accepted = tools::calendar("2025-11-30", "Flight to Mumbai");
        assert_eq!(accepted.exit_code, 0);

        let rejected = tools::calendar("30-11-2025", "Flight to Mumbai");
        assert_eq!(rejected.exit_code, 3);
        assert_eq!(parse_payload(&rejected.output)["error_class"], "invalid_input");
    });
}

#[test]
fn commands_report_config_failure() {
    with_env(&[("SKYHOP_BUDGET_LIMIT", "-10")], || {
        let result = tools::book("FL421", "John Smith");
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");

        let demo = demo::run();
        assert_eq!(demo.exit_code, 2);
    });
}

#[test]
fn demo_runs_queries_and_reports_final_budget() {
    with_env(&[], || {
        let result = demo::run();
        assert_eq!(result.exit_code, 0, "expected demo success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "demo");
        let message = payload["message"].as_str().unwrap_or_default();
        for query in demo::DEMO_QUERIES {
            assert!(message.contains(query), "demo output should echo `{query}`");
        }
        assert!(message.contains("Calendar Event Created"));
        assert!(message.contains("Final budget status: $"));
        assert!(message.trim_end().ends_with("/ $1000"));
    });
}

#[test]
fn doctor_json_passes_with_default_config() {
    with_env(&[], || {
        let output = doctor::run(true);
        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(3));
    });
}

#[test]
fn doctor_fails_when_openai_has_no_key() {
    with_env(&[("SKYHOP_LLM_PROVIDER", "openai")], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation"));
        assert!(output.contains("- [skip] planner_readiness"));
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_keys() {
    with_env(
        &[
            ("SKYHOP_LLM_PROVIDER", "openai"),
            ("SKYHOP_LLM_API_KEY", "sk-super-secret"),
            ("SKYHOP_BUDGET_LIMIT", "750"),
        ],
        || {
            let output = config::run();
            assert!(output.contains("- budget.limit = 750 (source: env (SKYHOP_BUDGET_LIMIT))"));
            assert!(output.contains("- llm.api_key = sk-*** (source: env (SKYHOP_LLM_API_KEY))"));
            assert!(output.contains("- llm.model = gpt-4 (source: default)"));
            assert!(!output.contains("super-secret"));
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SKYHOP_BUDGET_LIMIT",
        "SKYHOP_BUDGET_CURRENCY",
        "SKYHOP_CATALOG_MODE",
        "SKYHOP_CATALOG_MAX_RESULTS",
        "SKYHOP_LLM_PROVIDER",
        "SKYHOP_LLM_API_KEY",
        "SKYHOP_LLM_BASE_URL",
        "SKYHOP_LLM_MODEL",
        "SKYHOP_LLM_TEMPERATURE",
        "SKYHOP_LLM_TIMEOUT_SECS",
        "SKYHOP_LLM_MAX_ITERATIONS",
        "SKYHOP_SERVER_BIND_ADDRESS",
        "SKYHOP_SERVER_PORT",
        "SKYHOP_SERVER_ENVIRONMENT",
        "SKYHOP_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "SKYHOP_LOGGING_LEVEL",
        "SKYHOP_LOGGING_FORMAT",
        "SKYHOP_LOG_LEVEL",
        "SKYHOP_LOG_FORMAT",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "AGENT_TEMPERATURE",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
