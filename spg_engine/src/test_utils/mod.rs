//! Helpers for tests, in this crate and downstream. Enabled with the `test_utils` feature.
pub mod fake_gateway;
pub mod prepare_env;
