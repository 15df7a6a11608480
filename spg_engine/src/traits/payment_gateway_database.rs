use thiserror::Error;

use crate::{
    db_types::{InvoiceDetails, NewOrder, Order, OrderId, ProductId},
    traits::{
        data_objects::{ErrorTransition, PaidTransition},
        AccountApiError,
        AccountManagement,
        CatalogApiError,
        CatalogManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the payment engine.
///
/// This behaviour includes:
/// * Creating orders in the ledger, optionally reserving stock at the same time
/// * Attaching invoice details to pending orders
/// * The order status state machine: `pending → paid` and `pending → error`. Both terminal states are final, and
///   `paid` is never overwritten.
///
/// Every status transition must be a compare-and-set on the status column. Implementations may never read the status
/// and then write it in a separate step.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + AccountManagement + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new `pending` order. The user account is created if it does not exist yet.
    ///
    /// If `reserve_stock` is true, every line of the snapshot atomically decrements the product's stock, provided
    /// enough stock is available. If any line cannot be reserved, nothing is written and
    /// [`PaymentGatewayError::InsufficientStock`] is returned.
    ///
    /// An existing order id results in [`PaymentGatewayError::OrderAlreadyExists`].
    async fn insert_order(&self, order: NewOrder, reserve_stock: bool) -> Result<Order, PaymentGatewayError>;

    /// Records the gateway's invoice id and payment URL on a `pending` order.
    async fn attach_invoice(&self, order_id: &OrderId, invoice: InvoiceDetails) -> Result<Order, PaymentGatewayError>;

    /// The `pending → paid` transition. Idempotent: an order that is already paid yields
    /// [`PaidTransition::AlreadyPaid`] with no side effects.
    ///
    /// When the order is a top-up (see [`OrderId::is_topup`]), the owner's balance is credited by the order total in the
    /// same transaction as the status change, so a credit happens exactly when the transition does.
    ///
    /// Orders in `error`, and unknown orders, result in [`PaymentGatewayError::InvalidTransition`].
    async fn mark_paid(&self, order_id: &OrderId) -> Result<PaidTransition, PaymentGatewayError>;

    /// The `pending → error` transition. Idempotent, and never overwrites `paid`.
    async fn mark_error(&self, order_id: &OrderId) -> Result<ErrorTransition, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: String, to: String },
    #[error("Not enough stock of {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: u32, available: i64 },
    #[error("The product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
    #[error("{0}")]
    CatalogError(#[from] CatalogApiError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
