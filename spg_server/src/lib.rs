//! # SPG server
//! This module hosts the HTTP server for the storefront payment gateway. It is responsible for:
//! Serving the catalog, carts and checkout to the storefront front-end.
//! Receiving signed payment notifications from NOWPayments and settling the matching orders.
//! Letting operators mark orders as paid by hand and adjust stock.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/nowpayments/webhook`: Payment notifications. Requests must carry a valid `x-nowpayments-sig` header.
//! * `/shop/products`: The catalog.
//! * `/shop/users`, `/shop/users/{user_id}`: Registration and profiles.
//! * `/shop/cart/{user_id}`, `/shop/cart/{user_id}/items[/{product_id}]`: Cart contents, with a price quote.
//! * `/shop/checkout/{user_id}`, `/shop/topup/{user_id}`: Create an order and its invoice.
//! * `/shop/orders/{user_id}`: A user's most recent orders.
//! * `/admin/orders/{order_id}/mark_paid`, `/admin/products/{product_id}/stock`: Operator-only routes.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
