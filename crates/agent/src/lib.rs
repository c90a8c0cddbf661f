//! Agent Runtime - planning and tool orchestration for flight bookings
//!
//! The agent follows a perception / planning / action loop:
//! 1. **Perception** (`conversation`) - free text or a validated `BookingRequest`
//! 2. **Planning** (`planner`) - a scripted or LLM-backed planner picks the next tool
//! 3. **Action** (`tools`) - search, book, and calendar tools run against the catalog
//!
//! Every charge passes through `guardrails`, which announces the high-stakes
//! action and reserves spend on the shared budget ledger before confirming.
//!
//! # Safety Principle
//!
//! The planner only chooses which tool to call and with which arguments. Fares,
//! budget decisions, and identifiers are produced deterministically by the core.

pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod planner;
pub mod runtime;
pub mod tools;

pub use conversation::{ExtractedIntent, IntentExtractor};
pub use guardrails::{ChargeIntent, GuardrailDecision, GuardrailPolicy};
pub use llm::{LlmClient, OpenAiClient};
pub use planner::{LlmPlanner, Planner, PlannerAction, ScriptedPlanner};
pub use runtime::{
    AgentOutcome, AgentRuntime, BookingStatus, OrchestratorError, OrchestratorFailure, RuntimeSettings,
};
pub use tools::{BookingTools, Tool, ToolName, ToolRegistry, ToolResult, ToolStatus};
