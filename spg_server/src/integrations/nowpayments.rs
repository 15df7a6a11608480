use log::*;
use nowpayments_tools::{NowPaymentsApi, NowPaymentsApiError, NowPaymentsConfig};
use spg_engine::{Invoice, InvoiceError, InvoiceGateway, InvoiceRequest};

/// The engine's invoice gateway, backed by the NOWPayments API.
#[derive(Clone)]
pub struct NowPaymentsGateway {
    api: NowPaymentsApi,
}

impl NowPaymentsGateway {
    pub fn new(config: NowPaymentsConfig) -> Result<Self, NowPaymentsApiError> {
        if config.api_key.is_empty() {
            warn!("🧾️ No NOWPayments API key is configured. Every invoice request will be rejected.");
        }
        let api = NowPaymentsApi::new(config)?;
        Ok(Self { api })
    }
}

impl InvoiceGateway for NowPaymentsGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let invoice = self
            .api
            .create_invoice(request.order_id.as_str(), request.amount, &request.description)
            .await
            .map_err(to_invoice_error)?;
        Ok(Invoice { invoice_id: invoice.invoice_id, payment_url: invoice.payment_url })
    }
}

fn to_invoice_error(e: NowPaymentsApiError) -> InvoiceError {
    match e {
        NowPaymentsApiError::AuthenticationRejected { status, .. } => InvoiceError::AuthenticationRejected(status),
        NowPaymentsApiError::MalformedResponse(s) | NowPaymentsApiError::JsonError(s) => {
            InvoiceError::MalformedResponse(s)
        },
        e => InvoiceError::Unavailable(e.to_string()),
    }
}
