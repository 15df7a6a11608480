//! Storefront Payment Engine
//!
//! This library contains the order–payment reconciliation core of the storefront. It is provider-agnostic: the
//! invoicing provider is reached through the [`InvoiceGateway`] trait, and the order ledger through the backend traits.
//!
//! The library is divided into these main sections:
//! 1. Database management and control. SQLite is the supported backend ([`SqliteDatabase`]). You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the [`db_types`] module and are public.
//! 2. The cart ([`cart`]). Carts are ephemeral, in-memory and per user.
//! 3. The engine public API ([`mod@spg_api`]): checkout and top-ups, payment settlement, operator overrides, accounts
//!    and the catalog.
//!
//! The engine also provides a set of events that can be subscribed to. These are emitted when an order is paid, or
//! when an order fails because no invoice could be created for it.
pub mod cart;
pub mod db_types;
pub mod events;
pub mod helpers;
mod spg_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use spg_api::{
    accounts_api::{AccountApi, RECENT_ORDERS_LIMIT},
    catalog_api::CatalogApi,
    checkout::{price_cart, PricedCart},
    errors::{CheckoutError, OrderFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
    override_api::ManualOverrideApi,
};
pub use traits::{
    AccountApiError,
    AccountManagement,
    CatalogApiError,
    CatalogManagement,
    ErrorTransition,
    Invoice,
    InvoiceError,
    InvoiceGateway,
    InvoiceRequest,
    PaidTransition,
    PaymentGatewayDatabase,
    PaymentGatewayError,
};
