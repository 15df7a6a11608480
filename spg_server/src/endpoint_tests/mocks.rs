use mockall::mock;
use spg_common::Money;
use spg_engine::{
    db_types::{NewProduct, NewUser, Order, OrderId, Product, ProductId, ProductUpdate, UserAccount, UserId},
    traits::{AccountApiError, AccountManagement, CatalogApiError, CatalogManagement},
};

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_orders_for_user(&self, user_id: UserId, limit: u32) -> Result<Vec<Order>, AccountApiError>;
        async fn register_user(&self, user: NewUser, referral_bonus: Money) -> Result<(UserAccount, bool), AccountApiError>;
    }
}

mock! {
    pub CatalogManager {}
    impl CatalogManagement for CatalogManager {
        async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogApiError>;
        async fn fetch_products(&self) -> Result<Vec<Product>, CatalogApiError>;
        async fn update_product(&self, product_id: &ProductId, update: ProductUpdate) -> Result<Product, CatalogApiError>;
        async fn seed_products(&self, products: &[NewProduct]) -> Result<u64, CatalogApiError>;
    }
}
