use serde::{Deserialize, Serialize};
use spg_common::Money;

use crate::db_types::{Order, OrderId};

/// The default amount of a wallet top-up.
pub const DEFAULT_TOPUP_AMOUNT: Money = Money::from_units(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFlowConfig {
    /// Atomically take stock when an order is created, instead of only checking it at pricing time.
    pub reserve_stock: bool,
    pub topup_amount: Money,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self { reserve_stock: false, topup_amount: DEFAULT_TOPUP_AMOUNT }
    }
}

/// What a successful checkout or top-up gives back to the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order_id: OrderId,
    pub total: Money,
    pub invoice_id: Option<String>,
    pub payment_url: Option<String>,
    pub order: Order,
}

impl From<Order> for CheckoutResult {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            total: order.total_amount,
            invoice_id: order.invoice_id.clone(),
            payment_url: order.payment_url.clone(),
            order,
        }
    }
}
