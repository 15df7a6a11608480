use serde::{Deserialize, Serialize};
use spg_common::Money;

use crate::db_types::Order;

/// The outcome of a `pending → paid` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaidTransition {
    /// The order moved from `pending` to `paid` in this call. `credited` holds the amount added to the owner's
    /// balance, which only happens for top-up orders.
    Transitioned { order: Order, credited: Option<Money> },
    /// The order was already paid. Nothing was changed.
    AlreadyPaid(Order),
}

impl PaidTransition {
    pub fn order(&self) -> &Order {
        match self {
            PaidTransition::Transitioned { order, .. } => order,
            PaidTransition::AlreadyPaid(order) => order,
        }
    }

    pub fn is_transitioned(&self) -> bool {
        matches!(self, PaidTransition::Transitioned { .. })
    }

    pub fn credited(&self) -> Option<Money> {
        match self {
            PaidTransition::Transitioned { credited, .. } => *credited,
            PaidTransition::AlreadyPaid(_) => None,
        }
    }
}

/// The outcome of a `pending → error` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ErrorTransition {
    Transitioned(Order),
    AlreadyErrored(Order),
    /// The order is already paid. Paid orders are never moved to `error`.
    PaidIsSticky(Order),
}

impl ErrorTransition {
    pub fn order(&self) -> &Order {
        match self {
            ErrorTransition::Transitioned(o) | ErrorTransition::AlreadyErrored(o) | ErrorTransition::PaidIsSticky(o) => o,
        }
    }
}
