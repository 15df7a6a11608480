use rand::RngCore;

use crate::db_types::{OrderId, TOPUP_ORDER_PREFIX};

/// Order ids carry 96 bits of randomness, so collisions are not a practical concern.
pub const ORDER_ID_ENTROPY_BYTES: usize = 12;

fn random_token() -> String {
    let mut bytes = [0u8; ORDER_ID_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A fresh id for a checkout order: 24 lowercase hex characters.
pub fn new_order_id() -> OrderId {
    OrderId(random_token())
}

/// A fresh id for a wallet top-up order: `TOPUP_` followed by 24 lowercase hex characters.
pub fn new_topup_order_id() -> OrderId {
    OrderId(format!("{TOPUP_ORDER_PREFIX}{}", random_token()))
}
