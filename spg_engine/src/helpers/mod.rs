mod catalog_seed;
mod order_ids;

pub use catalog_seed::default_catalog;
pub use order_ids::{new_order_id, new_topup_order_id, ORDER_ID_ENTROPY_BYTES};
