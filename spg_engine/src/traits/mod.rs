//! #  Backend and collaborator contracts.
//!
//! This module provides the interfaces that define the contracts of the payment engine database *backends*, and of the
//! external invoicing provider.
//!
//! ## Traits
//!
//! * [`PaymentGatewayDatabase`] defines the highest level of behavior for backends. It owns the order ledger and the
//!   order status state machine (`pending → paid | error`).
//! * [`AccountManagement`] provides methods for querying information about users and their orders.
//! * [`CatalogManagement`] provides access to the product catalog.
//! * [`InvoiceGateway`] is the boundary to the hosted invoicing provider.
mod account_management;
mod catalog_management;
mod data_objects;
mod invoice_gateway;
mod payment_gateway_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use data_objects::{ErrorTransition, PaidTransition};
pub use invoice_gateway::{Invoice, InvoiceError, InvoiceGateway, InvoiceRequest};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
