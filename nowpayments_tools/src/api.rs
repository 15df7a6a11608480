use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use spg_common::{Money, SETTLEMENT_CURRENCY_CODE_LOWER};

use crate::{
    config::NowPaymentsConfig,
    data_objects::{CreatedInvoice, InvoiceRequestBody},
    NowPaymentsApiError,
};

#[derive(Clone)]
pub struct NowPaymentsApi {
    config: NowPaymentsConfig,
    client: Arc<Client>,
}

impl NowPaymentsApi {
    pub fn new(config: NowPaymentsConfig) -> Result<Self, NowPaymentsApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| NowPaymentsApiError::Initialization(e.to_string()))?;
        headers.insert("x-api-key", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NowPaymentsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &NowPaymentsConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Sends a single POST request. 401 and 403 responses mean the API key was rejected, and a success response
    /// that is not JSON is reported as a malformed response.
    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, NowPaymentsApiError> {
        let url = self.url(path);
        trace!("🧾️ POST {url}");
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            trace!("🧾️ Request successful. {status}");
            let text = response.text().await?;
            return serde_json::from_str::<Value>(&text).map_err(|e| {
                debug!("🧾️ Response is not JSON. {e}. {text}");
                NowPaymentsApiError::MalformedResponse(text)
            });
        }
        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(NowPaymentsApiError::AuthenticationRejected { status: status.as_u16(), message })
            },
            _ => Err(NowPaymentsApiError::QueryError { status: status.as_u16(), message }),
        }
    }

    /// Creates a hosted invoice for `amount` and returns its id and payment URL.
    ///
    /// Transient failures are retried up to `max_attempts` times in total, waiting `backoff`, then twice that, and so
    /// on between attempts. Rejected credentials and malformed responses fail immediately.
    pub async fn create_invoice(
        &self,
        order_id: &str,
        amount: Money,
        description: &str,
    ) -> Result<CreatedInvoice, NowPaymentsApiError> {
        let body = InvoiceRequestBody {
            price_amount: (amount.to_decimal() * 100.0).round() / 100.0,
            price_currency: SETTLEMENT_CURRENCY_CODE_LOWER.to_string(),
            order_id: order_id.to_string(),
            order_description: description.to_string(),
            ipn_callback_url: self.config.ipn_callback_url.clone(),
        };
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            debug!("🧾️ Requesting invoice for order {order_id} ({amount}). Attempt {attempt}/{max_attempts}");
            let result = self.post_json("/invoice", &body).await.and_then(|value| {
                CreatedInvoice::from_response(&value)
                    .ok_or_else(|| NowPaymentsApiError::MalformedResponse(value.to_string()))
            });
            match result {
                Ok(invoice) => {
                    info!(
                        "🧾️ Invoice {} created for order {order_id}",
                        invoice.invoice_id.as_deref().unwrap_or("(no id)")
                    );
                    return Ok(invoice);
                },
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff * 2u32.saturating_pow(attempt - 1);
                    warn!("🧾️ Invoice request for order {order_id} failed: {e}. Retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    warn!("🧾️ Could not create an invoice for order {order_id}: {e}");
                    return Err(e);
                },
            }
        }
    }
}
