use chrono::Utc;
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use crate::{
    db_types::{InvoiceDetails, LineItem, NewOrder, Order, OrderId, OrderStatusType, UserId},
    traits::PaymentGatewayError,
};

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let items_json: String = row.try_get("items_json")?;
        let items: Vec<LineItem> = serde_json::from_str(&items_json)
            .map_err(|e| sqlx::Error::ColumnDecode { index: "items_json".into(), source: Box::new(e) })?;
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatusType>()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "status".into(), source: Box::new(e) })?;
        Ok(Self {
            order_id: row.try_get("order_id")?,
            user_id: row.try_get("user_id")?,
            items,
            total_amount: row.try_get("total_amount")?,
            status,
            invoice_id: row.try_get("invoice_id")?,
            payment_url: row.try_get("payment_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
///
/// The order is always created with `pending` status. An existing order id results in
/// [`PaymentGatewayError::OrderAlreadyExists`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let items_json = serde_json::to_string(&order.items)
        .map_err(|e| PaymentGatewayError::DatabaseError(format!("Could not serialize line items. {e}")))?;
    let order_id = order.order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                items_json,
                total_amount,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, 'pending', $5, $5)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .bind(items_json)
    .bind(order.total_amount)
    .bind(order.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(PaymentGatewayError::OrderAlreadyExists(order_id)),
        Err(e) => Err(e.into()),
    }
}

/// Returns the entry in the orders table for the corresponding `order_id`
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the most recent `limit` orders for the user, newest first.
pub async fn fetch_orders_for_user(
    user_id: UserId,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC LIMIT $2")
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(conn)
        .await?;
    trace!("📝️ Fetched {} orders for user {user_id}", orders.len());
    Ok(orders)
}

/// Compare-and-set on the order status. The status is only changed if it currently equals `from`.
///
/// Returns the updated order if the transition happened, or `None` if the order does not exist or is not in the `from`
/// state. The caller decides which of those two it was.
///
/// `UPDATE .. RETURNING` statements are always stepped to completion (`fetch_all`). Stopping after the first row leaves
/// the statement, and its implicit transaction, open on the connection.
pub(crate) async fn transition_status(
    order_id: &OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE order_id = $3 AND status = $4 RETURNING *",
    )
    .bind(to.as_str())
    .bind(Utc::now())
    .bind(order_id.as_str())
    .bind(from.as_str())
    .fetch_all(conn)
    .await?
    .pop();
    if order.is_some() {
        debug!("📝️ Order [{order_id}] moved from {from} to {to}");
    }
    Ok(order)
}

/// Stores the gateway invoice fields on a `pending` order. Returns `None` if there is no pending order with this id.
pub(crate) async fn attach_invoice(
    order_id: &OrderId,
    invoice: InvoiceDetails,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET invoice_id = $1, payment_url = $2, updated_at = $3
        WHERE order_id = $4 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(invoice.invoice_id)
    .bind(invoice.payment_url)
    .bind(Utc::now())
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?
    .pop();
    Ok(order)
}
