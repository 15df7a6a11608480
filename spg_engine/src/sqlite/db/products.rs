use log::{debug, info};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::CatalogApiError,
};

pub async fn fetch_product(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY name, id").fetch_all(conn).await?;
    Ok(products)
}

pub async fn update_product(
    product_id: &ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Product, CatalogApiError> {
    if update.price.is_some_and(|p| p.is_negative()) {
        return Err(CatalogApiError::InvalidUpdate("Price cannot be negative".into()));
    }
    if update.stock.is_some_and(|s| s < 0) {
        return Err(CatalogApiError::InvalidUpdate("Stock cannot be negative".into()));
    }
    if update.is_empty() {
        debug!("📦️ No fields to update for product {product_id}. Update request skipped.");
        return fetch_product(product_id, conn).await?.ok_or_else(|| CatalogApiError::ProductNotFound(product_id.clone()));
    }
    let mut builder = QueryBuilder::new("UPDATE products SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price.cents());
    }
    if let Some(stock) = update.stock {
        set_clause.push("stock = ");
        set_clause.push_bind_unseparated(stock);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id.as_str());
    builder.push(" RETURNING *");
    let product: Option<Product> = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    product.ok_or_else(|| CatalogApiError::ProductNotFound(product_id.clone()))
}

/// Atomically takes `quantity` units out of stock, provided at least that many are available.
/// Returns `false` (and changes nothing) when the product is missing or has too little stock.
pub async fn reserve_stock(
    product_id: &ProductId,
    quantity: u32,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let qty = i64::from(quantity);
    let result = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
        .bind(qty)
        .bind(product_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_products(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(conn).await?;
    Ok(count)
}

/// Inserts the products unless the catalog already has entries. Not atomic; call it inside a transaction.
pub async fn seed_products(products: &[NewProduct], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    if count_products(&mut *conn).await? > 0 {
        debug!("📦️ Catalog is not empty. Skipping seed");
        return Ok(0);
    }
    let mut inserted = 0;
    for p in products {
        let result = sqlx::query(
            "INSERT INTO products (id, name, alias, price, stock, description) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(p.id.as_str())
        .bind(&p.name)
        .bind(&p.alias)
        .bind(p.price.cents())
        .bind(p.stock)
        .bind(&p.description)
        .execute(&mut *conn)
        .await?;
        inserted += result.rows_affected();
    }
    info!("📦️ Seeded the catalog with {inserted} products");
    Ok(inserted)
}
