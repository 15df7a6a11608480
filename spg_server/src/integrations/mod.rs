pub mod nowpayments;
pub mod telegram;
