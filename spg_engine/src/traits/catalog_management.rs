use thiserror::Error;

use crate::db_types::{NewProduct, Product, ProductId, ProductUpdate};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Invalid product update: {0}")]
    InvalidUpdate(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// Read and administrative access to the product catalog.
///
/// Stock counts are only ever changed by [`CatalogManagement::update_product`], or by the optional stock reservation
/// step of [`crate::traits::PaymentGatewayDatabase::insert_order`].
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogApiError>;

    /// All products, ordered by name.
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogApiError>;

    /// Applies an administrative change to price and/or stock. Negative values are rejected.
    async fn update_product(&self, product_id: &ProductId, update: ProductUpdate) -> Result<Product, CatalogApiError>;

    /// Inserts the given products if the catalog is empty. Returns the number of products inserted.
    async fn seed_products(&self, products: &[NewProduct]) -> Result<u64, CatalogApiError>;
}
