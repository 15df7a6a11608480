//! A scripted [`InvoiceGateway`] for tests.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::traits::{Invoice, InvoiceError, InvoiceGateway, InvoiceRequest};

/// Answers invoice requests from a queue of scripted responses. When the queue is empty, every request succeeds with
/// `INV<n>` / `https://pay/INV<n>`, where `n` counts requests from 1.
///
/// Clones share the script and the request log.
#[derive(Debug, Clone, Default)]
pub struct FakeInvoiceGateway {
    script: Arc<Mutex<VecDeque<Result<Invoice, InvoiceError>>>>,
    requests: Arc<Mutex<Vec<InvoiceRequest>>>,
}

impl FakeInvoiceGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<Invoice, InvoiceError>) -> &Self {
        self.script.lock().expect("poisoned").push_back(response);
        self
    }

    pub fn push_invoice(&self, invoice_id: &str, payment_url: &str) -> &Self {
        self.push_response(Ok(Invoice {
            invoice_id: Some(invoice_id.to_string()),
            payment_url: Some(payment_url.to_string()),
        }))
    }

    pub fn requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().expect("poisoned").clone()
    }
}

impl InvoiceGateway for FakeInvoiceGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let n = {
            let mut requests = self.requests.lock().expect("poisoned");
            requests.push(request.clone());
            requests.len()
        };
        let scripted = self.script.lock().expect("poisoned").pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Invoice { invoice_id: Some(format!("INV{n}")), payment_url: Some(format!("https://pay/INV{n}")) })
        })
    }
}
