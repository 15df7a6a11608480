mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, SETTLEMENT_CURRENCY_CODE, SETTLEMENT_CURRENCY_CODE_LOWER};
pub use secret::Secret;
