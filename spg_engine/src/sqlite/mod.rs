//! SQLite backend for the storefront payment engine.
//!
//! The schema is managed by the embedded migrations in `src/sqlite/migrations`, applied with
//! [`SqliteDatabase::migrate`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
