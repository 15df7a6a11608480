//! # Storefront payment engine public API
//!
//! The `spg_api` module exposes the programmatic API for the engine. The API is modular, so that clients can pick and
//! choose the functionality they want.
//!
//! * [`order_flow_api`] handles checkout, wallet top-ups and payment settlement.
//! * [`override_api`] lets trusted operators mark orders as paid by hand.
//! * [`accounts_api`] registers users (with referral bonuses) and queries their balances and orders.
//! * [`catalog_api`] lists products and applies administrative price and stock changes.
//! * [`checkout`] holds the pure cart pricing logic.
//!
//! # API usage
//!
//! Every API instance is created by supplying a database backend that implements the backend traits it needs:
//!
//! ```rust,ignore
//! use spg_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements AccountManagement
//! let api = AccountApi::new(db);
//! let account = api.user(UserId(42)).await?;
//! ```

pub mod accounts_api;
pub mod catalog_api;
pub mod checkout;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod override_api;
