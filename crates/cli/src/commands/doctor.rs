use serde::Serialize;
use skyhop_agent::llm::OpenAiClient;
use skyhop_core::catalog::{DeterministicFarePricer, FlightCatalog};
use skyhop_core::config::{AppConfig, LlmProvider, LoadOptions};
use skyhop_core::domain::flight::FlightQuery;
use skyhop_core::validation::{Destination, Price};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_planner(&config));
            checks.push(check_catalog(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("planner_readiness"));
            checks.push(skipped("catalog_probe"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_planner(config: &AppConfig) -> DoctorCheck {
    match config.llm.provider {
        LlmProvider::Scripted => DoctorCheck {
            name: "planner_readiness",
            status: CheckStatus::Pass,
            details: "scripted planner needs no credentials".to_string(),
        },
        LlmProvider::OpenAi => match OpenAiClient::from_config(&config.llm) {
            Ok(client) => DoctorCheck {
                name: "planner_readiness",
                status: CheckStatus::Pass,
                details: format!("openai client ready for model `{}`", client.model()),
            },
            Err(error) => DoctorCheck {
                name: "planner_readiness",
                status: CheckStatus::Fail,
                details: format!("{error:#}"),
            },
        },
    }
}

// The probe must only return fares the query allows.
fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let catalog =
        FlightCatalog::new(DeterministicFarePricer, config.catalog.max_results, config.catalog.mode);
    let query = match (Destination::parse("Mumbai"), Price::parse("700")) {
        (Ok(destination), Ok(max_price)) => FlightQuery::new(destination, max_price),
        _ => {
            return DoctorCheck {
                name: "catalog_probe",
                status: CheckStatus::Fail,
                details: "probe query failed validation".to_string(),
            };
        }
    };

    let options = catalog.search(&query);
    let within_budget = options.iter().all(|option| query.max_price.covers(option.price));
    let within_limit = options.len() <= config.catalog.max_results;

    if within_budget && within_limit {
        DoctorCheck {
            name: "catalog_probe",
            status: CheckStatus::Pass,
            details: format!("{} option(s) for Mumbai under 700", options.len()),
        }
    } else {
        DoctorCheck {
            name: "catalog_probe",
            status: CheckStatus::Fail,
            details: "catalog returned options outside the query bounds".to_string(),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
