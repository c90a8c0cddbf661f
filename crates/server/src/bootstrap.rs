use std::sync::Arc;
use std::time::Duration;

use skyhop_agent::guardrails::GuardrailPolicy;
use skyhop_agent::llm::OpenAiClient;
use skyhop_agent::planner::{LlmPlanner, Planner, ScriptedPlanner};
use skyhop_agent::runtime::{AgentRuntime, RuntimeSettings};
use skyhop_agent::tools::{BookingTools, ToolRegistry};
use skyhop_core::catalog::{DeterministicFarePricer, FlightCatalog};
use skyhop_core::config::{AppConfig, ConfigError, LlmProvider, LoadOptions};
use skyhop_core::ledger::BudgetLedger;
use thiserror::Error;
use tracing::info;

use crate::{AppState, ServiceInfo};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client setup failed: {0}")]
    LlmClient(String),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        budget_limit = %config.budget.limit,
        "starting application bootstrap"
    );

    let state = build_state(&config)?;

    info!(
        event_name = "system.bootstrap.agent_ready",
        correlation_id = "bootstrap",
        planner = state.runtime.planner_kind(),
        tools = state.runtime.tools().len(),
        "agent runtime initialized"
    );

    Ok(Application { config, state })
}

/// Wires ledger, catalog, tools and planner from an already validated config.
pub fn build_state(config: &AppConfig) -> Result<AppState, BootstrapError> {
    let ledger = Arc::new(BudgetLedger::new(config.budget.limit));
    let catalog =
        FlightCatalog::new(DeterministicFarePricer, config.catalog.max_results, config.catalog.mode);
    let guardrails =
        GuardrailPolicy::new(Arc::clone(&ledger)).with_currency(config.budget.currency.clone());
    let registry = ToolRegistry::booking(Arc::new(BookingTools::new(catalog, guardrails)));

    let planner: Arc<dyn Planner> = match config.llm.provider {
        LlmProvider::Scripted => Arc::new(ScriptedPlanner),
        LlmProvider::OpenAi => {
            let client = OpenAiClient::from_config(&config.llm)
                .map_err(|error| BootstrapError::LlmClient(format!("{error:#}")))?;
            Arc::new(LlmPlanner::new(client))
        }
    };

    let settings = RuntimeSettings {
        max_iterations: config.llm.max_iterations,
        planner_timeout: Duration::from_secs(config.llm.timeout_secs),
    };

    let info = ServiceInfo {
        environment: config.server.environment.clone(),
        model: config.llm.model.clone(),
        currency: config.budget.currency.clone(),
    };

    Ok(AppState::new(AgentRuntime::new(planner, registry, settings), ledger, info))
}
