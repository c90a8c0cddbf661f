//! Process-wide budget ledger.
//!
//! The ledger only ever grows: a reservation is the single mutation, and it
//! happens in the same critical section as the limit check. Two concurrent
//! bookings can therefore never both observe a stale total.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_BUDGET_LIMIT: u32 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRejection {
    pub current_total: Decimal,
    pub attempted: Decimal,
    pub limit: Decimal,
}

impl BudgetRejection {
    pub fn would_total(&self) -> Decimal {
        self.current_total + self.attempted
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum LedgerDecision {
    Reserved { amount: Decimal, total: Decimal, remaining: Decimal },
    Rejected(BudgetRejection),
}

impl LedgerDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total: Decimal,
    pub limit: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug)]
pub struct BudgetLedger {
    limit: Decimal,
    spent: Mutex<Decimal>,
}

impl Default for BudgetLedger {
    fn default() -> Self {
        Self::new(Decimal::from(DEFAULT_BUDGET_LIMIT))
    }
}

impl BudgetLedger {
    pub fn new(limit: Decimal) -> Self {
        Self { limit, spent: Mutex::new(Decimal::ZERO) }
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn total(&self) -> Decimal {
        *self.lock()
    }

    pub fn remaining(&self) -> Decimal {
        (self.limit - self.total()).max(Decimal::ZERO)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let total = self.total();
        LedgerSnapshot { total, limit: self.limit, remaining: (self.limit - total).max(Decimal::ZERO) }
    }

    /// Reserves `amount` if the running total stays within the limit.
    ///
    /// Non-positive amounts are rejected so the total can never shrink.
    pub fn check_and_reserve(&self, amount: Decimal) -> LedgerDecision {
        let mut spent = self.lock();
        let current_total = *spent;

        if amount <= Decimal::ZERO || current_total + amount > self.limit {
            warn!(
                event_name = "booking.ledger.rejected",
                current_total = %current_total,
                attempted = %amount,
                limit = %self.limit,
                "budget reservation rejected"
            );
            return LedgerDecision::Rejected(BudgetRejection {
                current_total,
                attempted: amount,
                limit: self.limit,
            });
        }

        *spent = current_total + amount;
        let total = *spent;
        debug!(
            event_name = "booking.ledger.reserved",
            amount = %amount,
            total = %total,
            limit = %self.limit,
            "budget reserved"
        );
        LedgerDecision::Reserved { amount, total, remaining: self.limit - total }
    }

    // A panic while holding the lock cannot leave a half-applied reservation:
    // the only write is a single assignment after the check.
    fn lock(&self) -> MutexGuard<'_, Decimal> {
        self.spent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
