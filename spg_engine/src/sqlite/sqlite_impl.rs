//! `SqliteDatabase` is a concrete implementation of a storefront payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use spg_common::Money;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{db_url, new_pool, orders, products, user_accounts};
use crate::{
    db_types::{
        InvoiceDetails,
        NewOrder,
        NewProduct,
        NewUser,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ProductId,
        ProductUpdate,
        UserAccount,
        UserId,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        CatalogApiError,
        CatalogManagement,
        ErrorTransition,
        PaidTransition,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SPG_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Creates the database file if it is missing, and then connects to it.
    pub async fn create_if_missing(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Database {url} does not exist. Creating it");
            Sqlite::create_database(url).await?;
        }
        Self::new_with_url(url, max_connections).await
    }

    /// Brings the schema up to date by running the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn explain_failed_transition(
        &self,
        order_id: &OrderId,
        to: OrderStatusType,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        if let Some(o) = &order {
            trace!("🗃️ Order [{order_id}] is {} and cannot move to {to}", o.status);
        }
        Ok(order)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, reserve_stock: bool) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // Write first, so that the transaction holds the write lock before it reads anything.
        if user_accounts::ensure_user_exists(order.user_id, &mut tx).await? {
            debug!("🗃️ Created an account for user {} on their first order", order.user_id);
        }
        if orders::fetch_order_by_order_id(&order.order_id, &mut tx).await?.is_some() {
            return Err(PaymentGatewayError::OrderAlreadyExists(order.order_id));
        }
        if reserve_stock {
            for item in &order.items {
                if !products::reserve_stock(&item.product_id, item.quantity, &mut tx).await? {
                    let product = products::fetch_product(&item.product_id, &mut tx).await?;
                    // Dropping the transaction rolls back any reservations already made.
                    return match product {
                        Some(p) => Err(PaymentGatewayError::InsufficientStock {
                            product_id: p.id,
                            requested: item.quantity,
                            available: p.stock,
                        }),
                        None => Err(PaymentGatewayError::ProductNotFound(item.product_id.clone())),
                    };
                }
                trace!("🗃️ Reserved {} × {}", item.quantity, item.product_id);
            }
        }
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] for {} has been saved in the DB", order.order_id, order.total_amount);
        Ok(order)
    }

    async fn attach_invoice(&self, order_id: &OrderId, invoice: InvoiceDetails) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if let Some(order) = orders::attach_invoice(order_id, invoice, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Invoice {:?} attached to order [{order_id}]", order.invoice_id);
            return Ok(order);
        }
        let existing = orders::fetch_order_by_order_id(order_id, &mut tx).await?;
        tx.rollback().await?;
        match existing {
            None => Err(PaymentGatewayError::OrderNotFound(order_id.clone())),
            Some(o) => Err(PaymentGatewayError::InvalidTransition {
                order_id: order_id.clone(),
                from: o.status.to_string(),
                to: "invoiced".to_string(),
            }),
        }
    }

    async fn mark_paid(&self, order_id: &OrderId) -> Result<PaidTransition, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let updated =
            orders::transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Paid, &mut tx).await?;
        if let Some(order) = updated {
            let credited = if order.is_topup() {
                let balance = user_accounts::credit_balance(order.user_id, order.total_amount, &mut tx).await?;
                info!("🗃️ Top-up [{order_id}] credited {} to user {}. Balance: {balance}", order.total_amount, order.user_id);
                Some(order.total_amount)
            } else {
                None
            };
            tx.commit().await?;
            return Ok(PaidTransition::Transitioned { order, credited });
        }
        tx.rollback().await?;
        match self.explain_failed_transition(order_id, OrderStatusType::Paid).await? {
            Some(order) if order.status == OrderStatusType::Paid => Ok(PaidTransition::AlreadyPaid(order)),
            Some(order) => Err(PaymentGatewayError::InvalidTransition {
                order_id: order_id.clone(),
                from: order.status.to_string(),
                to: OrderStatusType::Paid.to_string(),
            }),
            None => Err(PaymentGatewayError::InvalidTransition {
                order_id: order_id.clone(),
                from: "unknown".to_string(),
                to: OrderStatusType::Paid.to_string(),
            }),
        }
    }

    async fn mark_error(&self, order_id: &OrderId) -> Result<ErrorTransition, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let updated =
            orders::transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Error, &mut tx).await?;
        if let Some(order) = updated {
            tx.commit().await?;
            return Ok(ErrorTransition::Transitioned(order));
        }
        tx.rollback().await?;
        match self.explain_failed_transition(order_id, OrderStatusType::Error).await? {
            Some(order) if order.status == OrderStatusType::Paid => {
                warn!("🗃️ Order [{order_id}] is already paid. It will not be marked as an error");
                Ok(ErrorTransition::PaidIsSticky(order))
            },
            Some(order) => Ok(ErrorTransition::AlreadyErrored(order)),
            None => Err(PaymentGatewayError::OrderNotFound(order_id.clone())),
        }
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::fetch_user_account(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: UserId, limit: u32) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, limit, &mut conn).await?;
        Ok(orders)
    }

    async fn register_user(
        &self,
        user: NewUser,
        referral_bonus: Money,
    ) -> Result<(UserAccount, bool), AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let result = user_accounts::register_user(user, referral_bonus, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }

    async fn update_product(&self, product_id: &ProductId, update: ProductUpdate) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::update_product(product_id, update, &mut conn).await?;
        info!("📦️ Product {} updated. Price: {}, stock: {}", product.id, product.price, product.stock);
        Ok(product)
    }

    async fn seed_products(&self, products: &[NewProduct]) -> Result<u64, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let inserted = products::seed_products(products, &mut tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }
}
