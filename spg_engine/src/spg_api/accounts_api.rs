//! Unifies API for accessing user accounts and their orders.

use std::fmt::Debug;

use log::trace;
use spg_common::Money;

use crate::{
    db_types::{NewUser, Order, OrderId, UserAccount, UserId},
    traits::{AccountApiError, AccountManagement},
};

/// How many orders the "my orders" view shows.
pub const RECENT_ORDERS_LIMIT: u32 = 10;

/// The default bonus paid to a referrer when a new user joins through their link.
pub const DEFAULT_REFERRAL_BONUS: Money = Money::from_units(1);

pub struct AccountApi<B> {
    db: B,
    referral_bonus: Money,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db, referral_bonus: DEFAULT_REFERRAL_BONUS }
    }

    pub fn with_referral_bonus(mut self, bonus: Money) -> Self {
        self.referral_bonus = bonus;
        self
    }

    /// Registers the user on first contact. See [`AccountManagement::register_user`] for the referral rules.
    pub async fn register_user(&self, user: NewUser) -> Result<(UserAccount, bool), AccountApiError> {
        self.db.register_user(user, self.referral_bonus).await
    }

    /// Fetches the user account for the given user id. If no account exists, `None` is returned.
    pub async fn user(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_user_account(user_id).await
    }

    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    /// The user's most recent orders, newest first.
    pub async fn orders_for_user(&self, user_id: UserId, limit: Option<u32>) -> Result<Vec<Order>, AccountApiError> {
        let limit = limit.unwrap_or(RECENT_ORDERS_LIMIT);
        trace!("🧑️ Fetching the last {limit} orders for user {user_id}");
        self.db.fetch_orders_for_user(user_id, limit).await
    }
}
