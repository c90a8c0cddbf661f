use std::sync::Arc;

use rust_decimal::Decimal;
use skyhop_core::domain::booking::HighStakesWarning;
use skyhop_core::ledger::{BudgetLedger, BudgetRejection, LedgerDecision};
use skyhop_core::validation::{FlightId, PassengerName};
use tracing::warn;

/// A charge the booking tool is about to make.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChargeIntent {
    pub flight_id: FlightId,
    pub passenger: PassengerName,
    pub amount: u32,
}

impl ChargeIntent {
    pub fn new(flight_id: FlightId, passenger: PassengerName, amount: u32) -> Self {
        Self { flight_id, passenger, amount }
    }

    pub fn warning(&self) -> HighStakesWarning {
        HighStakesWarning::new(self.flight_id.clone(), self.passenger.clone(), self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow { total: Decimal, remaining: Decimal },
    Deny {
        reason_code: &'static str,
        user_message: String,
        fallback_path: &'static str,
        rejection: BudgetRejection,
    },
}

impl GuardrailDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Budget guardrail in front of every charge. Fails closed: anything the
/// ledger does not reserve is denied.
#[derive(Clone, Debug)]
pub struct GuardrailPolicy {
    ledger: Arc<BudgetLedger>,
    currency: String,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self::new(Arc::new(BudgetLedger::default()))
    }
}

impl GuardrailPolicy {
    pub fn new(ledger: Arc<BudgetLedger>) -> Self {
        Self { ledger, currency: "$".to_string() }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn ledger(&self) -> &Arc<BudgetLedger> {
        &self.ledger
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Logs the high-stakes warning for a charge and hands it back for display.
    pub fn announce(&self, charge: &ChargeIntent) -> HighStakesWarning {
        let warning = charge.warning();
        warn!(
            event_name = "booking.guardrail.high_stakes",
            flight_id = %warning.flight_id,
            passenger = %warning.passenger,
            cost = warning.cost,
            "{}",
            warning.notice
        );
        warning
    }

    pub fn evaluate(&self, charge: &ChargeIntent) -> GuardrailDecision {
        match self.ledger.check_and_reserve(Decimal::from(charge.amount)) {
            LedgerDecision::Reserved { total, remaining, .. } => {
                GuardrailDecision::Allow { total, remaining }
            }
            LedgerDecision::Rejected(rejection) => {
                warn!(
                    event_name = "booking.guardrail.blocked",
                    flight_id = %charge.flight_id,
                    reason_code = "budget_exceeded",
                    current_total = %rejection.current_total,
                    attempted = %rejection.attempted,
                    limit = %rejection.limit,
                    "booking blocked by budget guardrail"
                );
                GuardrailDecision::Deny {
                    reason_code: "budget_exceeded",
                    user_message: self.blocked_message(&rejection),
                    fallback_path: "choose_cheaper_flight",
                    rejection,
                }
            }
        }
    }

    fn blocked_message(&self, rejection: &BudgetRejection) -> String {
        let currency = &self.currency;
        format!(
            "BOOKING BLOCKED: Budget exceeded! Current spending: {currency}{}, Flight cost: {currency}{}, Budget limit: {currency}{}",
            rejection.current_total, rejection.attempted, rejection.limit
        )
    }
}
