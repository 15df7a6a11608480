use spg_common::Money;
use thiserror::Error;

use crate::db_types::{NewUser, Order, OrderId, UserAccount, UserId};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for managing user accounts and querying their orders.
///
/// A user account is keyed on the chat platform's numeric user id. It carries the wallet balance (credited by
/// referrals and paid top-up orders) and the referral count.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the user account for the given user id. If no account exists, `None` is returned.
    async fn fetch_user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError>;

    /// Fetches the most recent orders for the user, newest first.
    async fn fetch_orders_for_user(&self, user_id: UserId, limit: u32) -> Result<Vec<Order>, AccountApiError>;

    /// Creates the user account if it does not exist yet.
    ///
    /// When the account is created, and it names a referrer that already exists and is not the user themselves, the
    /// referrer's `referrals_count` is incremented and `referral_bonus` is added to their balance, in the same atomic
    /// transaction. Registering an existing user never changes anything, so the bonus is paid at most once per
    /// referred user.
    ///
    /// Returns the account, and `true` if it was created in this call.
    async fn register_user(
        &self,
        user: NewUser,
        referral_bonus: Money,
    ) -> Result<(UserAccount, bool), AccountApiError>;
}
