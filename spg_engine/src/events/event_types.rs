use serde::{Deserialize, Serialize};
use spg_common::Money;

use crate::db_types::{Order, UserId};

/// Who confirmed a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementSource {
    /// A verified callback from the invoicing provider.
    Webhook,
    /// A trusted operator, by user id.
    Operator(UserId),
}

/// Emitted once, when an order actually moves from `pending` to `paid`. Duplicate settlements do not emit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    /// The balance credit, for top-up orders.
    pub credited: Option<Money>,
    pub source: SettlementSource,
}

impl OrderPaidEvent {
    pub fn new(order: Order, credited: Option<Money>, source: SettlementSource) -> Self {
        Self { order, credited, source }
    }
}

/// Emitted when an order moves to `error` because its invoice could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    pub reason: String,
}

impl OrderFailedEvent {
    pub fn new(order: Order, reason: String) -> Self {
        Self { order, reason }
    }
}
