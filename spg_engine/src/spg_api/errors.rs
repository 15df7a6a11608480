use thiserror::Error;

use crate::{
    db_types::{OrderId, ProductId},
    traits::{AccountApiError, CatalogApiError, InvoiceError, PaymentGatewayError},
};

/// Reasons a cart cannot be priced. None of these ever touch the order ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("The product {0} does not exist")]
    UnknownProduct(ProductId),
    #[error("Insufficient stock for {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: u32, available: i64 },
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    CheckoutError(#[from] CheckoutError),
    #[error("An order with id {0} already exists")]
    DuplicateOrderId(OrderId),
    #[error("The order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The product {0} does not exist")]
    UnknownProduct(ProductId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: String, to: String },
    #[error("Could not create an invoice for order {order_id}. {source}")]
    InvoiceCreationFailed { order_id: OrderId, source: InvoiceError },
    #[error("Permission denied. {0}")]
    PermissionDenied(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl OrderFlowError {
    /// True when the invoicing provider rejected our credentials.
    pub fn is_gateway_auth_rejection(&self) -> bool {
        matches!(self, OrderFlowError::InvoiceCreationFailed { source, .. } if source.is_auth_rejection())
    }
}

impl From<PaymentGatewayError> for OrderFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            PaymentGatewayError::OrderAlreadyExists(id) => OrderFlowError::DuplicateOrderId(id),
            PaymentGatewayError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            PaymentGatewayError::InvalidTransition { order_id, from, to } => {
                OrderFlowError::InvalidTransition { order_id, from, to }
            },
            PaymentGatewayError::InsufficientStock { product_id, requested, available } => {
                CheckoutError::InsufficientStock { product_id, requested, available }.into()
            },
            PaymentGatewayError::ProductNotFound(id) => OrderFlowError::UnknownProduct(id),
            PaymentGatewayError::AccountError(e) => e.into(),
            PaymentGatewayError::CatalogError(e) => e.into(),
        }
    }
}

impl From<AccountApiError> for OrderFlowError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            AccountApiError::QueryError(s) => OrderFlowError::InvalidRequest(s),
        }
    }
}

impl From<CatalogApiError> for OrderFlowError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            CatalogApiError::ProductNotFound(id) => OrderFlowError::UnknownProduct(id),
            CatalogApiError::InvalidUpdate(s) => OrderFlowError::InvalidRequest(s),
        }
    }
}
