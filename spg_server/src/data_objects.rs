use std::fmt::Display;

use serde::{Deserialize, Serialize};
use spg_common::Money;
use spg_engine::{
    cart::Cart,
    db_types::{OrderId, ProductId, UserId},
    order_objects::CheckoutResult,
    PricedCart,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// The acknowledgement sent back to the payment provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub ok: bool,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserParams {
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub referred_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartParams {
    pub product_id: ProductId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user's cart, with a price quote when every line can currently be fulfilled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub total: Option<Money>,
    /// Why the cart cannot be checked out as it stands, if it can't.
    pub problem: Option<String>,
}

impl CartView {
    pub fn new(user_id: UserId, cart: &Cart) -> Self {
        let lines =
            cart.iter().map(|(product_id, quantity)| CartLine { product_id: product_id.clone(), quantity }).collect();
        Self { user_id, lines, total: None, problem: None }
    }

    pub fn with_quote(mut self, quote: Result<PricedCart, String>) -> Self {
        match quote {
            Ok(priced) => self.total = Some(priced.total),
            Err(problem) => self.problem = Some(problem),
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub total: Money,
    pub invoice_id: Option<String>,
    pub payment_url: Option<String>,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        Self {
            order_id: result.order_id,
            total: result.total,
            invoice_id: result.invoice_id,
            payment_url: result.payment_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStockParams {
    pub stock: i64,
}

/// The outcome of a manual override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPaidResponse {
    pub order_id: OrderId,
    /// False if the order was already paid, and nothing changed.
    pub transitioned: bool,
    pub credited: Option<Money>,
}
