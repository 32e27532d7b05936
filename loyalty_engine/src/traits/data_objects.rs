use serde::{Deserialize, Serialize};

use crate::db_types::{Cents, Order, UserAccount};

/// The current balance of an account, along with everything the user has withdrawn over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub current: Cents,
    pub withdrawn: Cents,
}

/// The result of a successful credit transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// The order was marked as processed and the accrual was added to the owner's balance.
    Credited { order: Order, account: UserAccount },
    /// The order had already reached a terminal state. Nothing was changed.
    AlreadyResolved(Order),
}
