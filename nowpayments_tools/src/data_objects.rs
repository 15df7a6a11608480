//! Wire types for the invoice endpoint and IPN callbacks.
//!
//! The API is not consistent about where it puts things, so fields are located with ordered lists of candidate
//! paths. The first candidate that is present wins.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Candidate locations of the invoice id in an invoice response.
pub const INVOICE_ID_PATHS: &[&[&str]] = &[&["id"], &["invoice_id"], &["data", "id"]];
/// Candidate locations of the hosted payment page URL in an invoice response.
pub const PAYMENT_URL_PATHS: &[&[&str]] = &[&["invoice_url"], &["payment_url"], &["url"], &["data", "invoice_url"]];
/// Candidate locations of our order reference in an IPN payload.
pub const ORDER_REFERENCE_PATHS: &[&[&str]] = &[&["order_id"], &["order"], &["invoice_id"], &["id"]];
/// Candidate locations of the payment status in an IPN payload.
pub const PAYMENT_STATUS_PATHS: &[&[&str]] = &[&["payment_status"], &["status"], &["pay_status"]];
/// Payment statuses (compared case-insensitively) that mean the money has arrived.
pub const SETTLED_STATUSES: &[&str] = &["confirmed", "finished", "paid", "success"];

/// Follows `path` into `value` and renders what it finds as a string. Strings are returned as-is, and numbers are
/// rendered in decimal. Nulls, empty strings and other JSON types count as absent.
pub fn lookup(value: &Value, path: &[&str]) -> Option<String> {
    let found = path.iter().try_fold(value, |v, key| v.get(key))?;
    match found {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Tries each candidate path in order, and returns the first value found.
pub fn first_present(value: &Value, candidates: &[&[&str]]) -> Option<String> {
    candidates.iter().find_map(|path| lookup(value, path))
}

/// The body of `POST /invoice`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRequestBody {
    /// The amount in major units, rounded to two decimal places.
    pub price_amount: f64,
    pub price_currency: String,
    pub order_id: String,
    pub order_description: String,
    pub ipn_callback_url: String,
}

/// The parts of an invoice response that we care about. At least one field is always set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedInvoice {
    pub invoice_id: Option<String>,
    pub payment_url: Option<String>,
}

impl CreatedInvoice {
    /// Extracts the invoice id and payment URL from an invoice response. Returns `None` only if both are missing.
    pub fn from_response(value: &Value) -> Option<Self> {
        let invoice_id = first_present(value, INVOICE_ID_PATHS);
        let payment_url = first_present(value, PAYMENT_URL_PATHS);
        if invoice_id.is_none() && payment_url.is_none() {
            return None;
        }
        Some(Self { invoice_id, payment_url })
    }
}

/// A normalized IPN callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpnNotification {
    pub order_reference: Option<String>,
    pub payment_status: Option<String>,
}

impl IpnNotification {
    pub fn from_payload(value: &Value) -> Self {
        Self {
            order_reference: first_present(value, ORDER_REFERENCE_PATHS),
            payment_status: first_present(value, PAYMENT_STATUS_PATHS),
        }
    }

    /// True if the payment status says the invoice has been paid.
    pub fn is_settled(&self) -> bool {
        self.payment_status
            .as_deref()
            .map(|s| SETTLED_STATUSES.iter().any(|ok| s.trim().eq_ignore_ascii_case(ok)))
            .unwrap_or(false)
    }
}
