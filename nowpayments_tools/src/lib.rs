//! # NOWPayments tools
//!
//! A small client for the hosted invoicing API of NOWPayments, and the helpers needed to verify the IPN (instant
//! payment notification) callbacks it sends back.
//!
//! * [`NowPaymentsApi`] creates invoices, retrying transient failures with exponential backoff.
//! * [`data_objects`] holds the wire types, and the extraction rules that cope with the different response shapes
//!   the API returns.
//! * [`helpers`] provides canonical JSON serialization and HMAC-SHA512 signing/verification of IPN payloads.
mod api;
mod config;
pub mod data_objects;
mod error;
pub mod helpers;

pub use api::NowPaymentsApi;
pub use config::{NowPaymentsConfig, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};
pub use data_objects::{CreatedInvoice, InvoiceRequestBody, IpnNotification};
pub use error::NowPaymentsApiError;
pub use helpers::{canonical_json, sign_ipn_payload, verify_ipn_signature, SignatureError};
