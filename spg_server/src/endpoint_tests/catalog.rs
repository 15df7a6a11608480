use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use spg_common::Money;
use spg_engine::{
    db_types::{Product, ProductId, UserId},
    CatalogApi,
    CatalogApiError,
};

use super::{
    helpers::{as_operator, json, send_request, ADMIN},
    mocks::MockCatalogManager,
};
use crate::{
    config::OperatorAccess,
    routes::{ProductsRoute, UpdateStockRoute},
};

fn product(id: &str, stock: i64) -> Product {
    Product {
        id: id.into(),
        name: "Mango Kent".into(),
        alias: Some("mango".into()),
        price: Money::from_cents(450),
        stock,
        description: None,
    }
}

fn configure_with(catalog: MockCatalogManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(ProductsRoute::<MockCatalogManager>::new())
            .service(UpdateStockRoute::<MockCatalogManager>::new())
            .app_data(web::Data::new(CatalogApi::new(catalog)))
            .app_data(web::Data::new(OperatorAccess::new([ADMIN], None)));
    }
}

#[actix_web::test]
async fn list_products() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_products().returning(|| Ok(vec![product("mnk001", 20)]));
    let (status, body) = send_request(TestRequest::get().uri("/products"), configure_with(catalog)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body[0]["id"], "mnk001");
    assert_eq!(body[0]["price"], 450);
    assert_eq!(body[0]["stock"], 20);
}

#[actix_web::test]
async fn set_stock_as_operator() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalogManager::new();
    catalog
        .expect_update_product()
        .withf(|id, update| id == &ProductId::from("mnk001") && update.stock == Some(7) && update.price.is_none())
        .times(1)
        .returning(|id, update| Ok(product(id.as_str(), update.stock.unwrap_or_default())));
    let req = as_operator(TestRequest::put().uri("/products/mnk001/stock"), ADMIN).set_json(serde_json::json!({"stock": 7}));
    let (status, body) = send_request(req, configure_with(catalog)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["stock"], 7);
}

#[actix_web::test]
async fn set_stock_needs_an_operator() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_update_product().never();
    let req = TestRequest::put().uri("/products/mnk001/stock").set_json(serde_json::json!({"stock": 7}));
    let (status, _) = send_request(req, configure_with(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut catalog = MockCatalogManager::new();
    catalog.expect_update_product().never();
    let req = as_operator(TestRequest::put().uri("/products/mnk001/stock"), UserId(1001))
        .set_json(serde_json::json!({"stock": 7}));
    let (status, body) = send_request(req, configure_with(catalog)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. User 1001 is not an operator"}"#);
}

#[actix_web::test]
async fn catalog_errors() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_update_product().returning(|id, _| Err(CatalogApiError::ProductNotFound(id.clone())));
    let req = as_operator(TestRequest::put().uri("/products/nope/stock"), ADMIN).set_json(serde_json::json!({"stock": 1}));
    let (status, body) = send_request(req, configure_with(catalog)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. The product nope does not exist"}"#);

    let mut catalog = MockCatalogManager::new();
    catalog.expect_update_product().returning(|_, _| Err(CatalogApiError::InvalidUpdate("Stock cannot be negative".into())));
    let req = as_operator(TestRequest::put().uri("/products/mnk001/stock"), ADMIN).set_json(serde_json::json!({"stock": -1}));
    let (status, _) = send_request(req, configure_with(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
