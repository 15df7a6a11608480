use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::{CatalogApiError, CatalogManagement},
};

/// Read access to the catalog, plus the administrative price and stock adjustments.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn products(&self) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_products().await
    }

    pub async fn set_stock(&self, product_id: &ProductId, stock: i64) -> Result<Product, CatalogApiError> {
        self.update_product(product_id, ProductUpdate::default().with_stock(stock)).await
    }

    pub async fn update_product(&self, product_id: &ProductId, update: ProductUpdate) -> Result<Product, CatalogApiError> {
        self.db.update_product(product_id, update).await
    }

    /// Seeds the catalog if it is empty. Returns the number of products inserted.
    pub async fn seed_if_empty(&self, products: &[NewProduct]) -> Result<u64, CatalogApiError> {
        let n = self.db.seed_products(products).await?;
        if n == 0 {
            debug!("📦️ Catalog already populated");
        }
        Ok(n)
    }
}
