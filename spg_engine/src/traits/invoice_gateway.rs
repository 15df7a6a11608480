use serde::{Deserialize, Serialize};
use spg_common::Money;
use thiserror::Error;

use crate::db_types::OrderId;

/// What the engine asks the invoicing provider for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub description: String,
}

/// A hosted invoice. At least one of the two fields is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Option<String>,
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum InvoiceError {
    /// The provider rejected our credentials (HTTP 401/403). This is a configuration problem and is never retried.
    #[error("The invoicing provider rejected the API key (HTTP {0}). Check the gateway configuration.")]
    AuthenticationRejected(u16),
    /// The response had neither an invoice id nor a payment URL.
    #[error("The invoicing provider returned an unusable response: {0}")]
    MalformedResponse(String),
    /// Network failure, timeout, or an error status that survived all retries.
    #[error("The invoicing provider is unavailable: {0}")]
    Unavailable(String),
}

impl InvoiceError {
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, InvoiceError::AuthenticationRejected(_))
    }
}

/// The boundary to the hosted invoicing provider.
#[allow(async_fn_in_trait)]
pub trait InvoiceGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError>;
}
