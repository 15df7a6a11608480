use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use spg_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Orders whose id starts with this prefix credit the owner's wallet balance once paid, rather than buying products.
pub const TOPUP_ORDER_PREFIX: &str = "TOPUP_";

/// The pseudo-product used in the line-item snapshot of a top-up order.
pub const TOPUP_PRODUCT_ID: &str = "balance_topup";

//--------------------------------------        UserId        ---------------------------------------------------------
/// The chat platform's numeric account id for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

//--------------------------------------      ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Top-up orders are recognised purely by their id prefix.
    pub fn is_topup(&self) -> bool {
        self.0.starts_with(TOPUP_ORDER_PREFIX)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the payment gateway to confirm payment.
    Pending,
    /// Payment has been confirmed, either by the gateway or by an operator. Terminal.
    Paid,
    /// The invoice could not be created, or the order was otherwise abandoned. Terminal.
    Error,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Paid => "paid",
            OrderStatusType::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "error" => Ok(Self::Error),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub alias: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub description: Option<String>,
}

/// A product record used to seed the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub alias: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(id: &str, name: &str, price: Money, stock: i64) -> Self {
        Self { id: id.into(), name: name.to_string(), alias: None, price, stock, description: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Administrative changes to a catalog entry. Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub price: Option<Money>,
    pub stock: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.stock.is_none()
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
/// One line of an order, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price * i64::from(self.quantity)
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub invoice_id: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_topup(&self) -> bool {
        self.order_id.is_topup()
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The order id generated at checkout time
    pub order_id: OrderId,
    /// The user placing the order
    pub user_id: UserId,
    /// The line-item snapshot taken at checkout time
    pub items: Vec<LineItem>,
    /// The total of the snapshot. Never recomputed after insertion.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, user_id: UserId, items: Vec<LineItem>) -> Self {
        let total_amount = items.iter().map(LineItem::subtotal).sum();
        Self { order_id, user_id, items, total_amount, created_at: Utc::now() }
    }

    /// A top-up order with a single `balance_topup` line.
    pub fn topup(order_id: OrderId, user_id: UserId, amount: Money) -> Self {
        let item = LineItem {
            product_id: TOPUP_PRODUCT_ID.into(),
            name: "Wallet top-up".to_string(),
            quantity: 1,
            unit_price: amount,
        };
        Self::new(order_id, user_id, vec![item])
    }
}

//--------------------------------------     InvoiceDetails    ---------------------------------------------------------
/// The gateway-issued fields that are attached to a pending order once the invoice exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub invoice_id: Option<String>,
    pub payment_url: Option<String>,
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: UserId,
    pub username: Option<String>,
    pub referred_by: Option<UserId>,
    pub balance: Money,
    pub referrals_count: i64,
    pub first_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: UserId,
    pub username: Option<String>,
    pub referred_by: Option<UserId>,
}

impl NewUser {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, username: None, referred_by: None }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn referred_by(mut self, referrer: UserId) -> Self {
        self.referred_by = Some(referrer);
        self
    }
}
