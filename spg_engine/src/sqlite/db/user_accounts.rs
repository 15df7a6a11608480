use chrono::Utc;
use log::{debug, info};
use spg_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, UserAccount, UserId},
    traits::AccountApiError,
};

pub async fn fetch_user_account(
    user_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let account =
        sqlx::query_as("SELECT * FROM users WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(account)
}

/// Creates an empty account for the user if one does not exist yet. Returns `true` if a row was inserted.
pub async fn ensure_user_exists(user_id: UserId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO users (user_id, first_seen) VALUES ($1, $2)")
        .bind(user_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Creates the account if it is absent and pays the referral bonus for new accounts. This is not atomic; call it
/// inside a transaction.
pub async fn register_user(
    user: NewUser,
    referral_bonus: Money,
    conn: &mut SqliteConnection,
) -> Result<(UserAccount, bool), AccountApiError> {
    if let Some(existing) = fetch_user_account(user.user_id, &mut *conn).await? {
        return Ok((existing, false));
    }
    let referrer = user.referred_by.filter(|r| *r != user.user_id);
    let account: UserAccount = sqlx::query_as(
        r#"
        INSERT INTO users (user_id, username, first_seen, referred_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(user.username)
    .bind(Utc::now())
    .bind(referrer)
    .fetch_one(&mut *conn)
    .await?;
    debug!("🧑️ New user {} registered", account.user_id);
    if let Some(referrer) = referrer {
        let result = sqlx::query(
            "UPDATE users SET referrals_count = referrals_count + 1, balance = balance + $1 WHERE user_id = $2",
        )
        .bind(referral_bonus.cents())
        .bind(referrer)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() > 0 {
            info!("🧑️ User {referrer} referred {}. Credited {referral_bonus}", account.user_id);
        } else {
            debug!("🧑️ Referrer {referrer} of user {} is not a known user. No bonus paid", account.user_id);
        }
    }
    Ok((account, true))
}

/// Adds `amount` to the user's balance. Returns the new balance.
pub async fn credit_balance(user_id: UserId, amount: Money, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let balance: Money = sqlx::query_scalar("UPDATE users SET balance = balance + $1 WHERE user_id = $2 RETURNING balance")
        .bind(amount.cents())
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    debug!("🧑️ Credited {amount} to user {user_id}. New balance: {balance}");
    Ok(balance)
}
