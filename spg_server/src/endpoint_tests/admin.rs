use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json as value;
use spg_engine::{
    db_types::{OrderStatusType, ProductId},
    AccountManagement,
    CatalogManagement,
};

use super::helpers::{as_operator, json, TestContext, ADMIN, ALICE};

fn mark_paid(order_id: &str) -> TestRequest {
    TestRequest::post().uri(&format!("/admin/orders/{order_id}/mark_paid"))
}

#[actix_web::test]
async fn mark_paid_requires_an_operator() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    let (status, body) = ctx.send(mark_paid(topup.order_id.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Missing or invalid operator id"}"#);

    let req = mark_paid(topup.order_id.as_str()).insert_header(("x-operator-id", "admin"));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.send(as_operator(mark_paid(topup.order_id.as_str()), ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let order = ctx.db.fetch_order_by_order_id(&topup.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn operators_can_mark_orders_paid() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    let (status, body) = ctx.send(as_operator(mark_paid(topup.order_id.as_str()), ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["transitioned"], true);
    assert_eq!(body["credited"], 500);

    let (status, body) = ctx.send(as_operator(mark_paid(topup.order_id.as_str()), ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["transitioned"], false);
    assert!(body["credited"].is_null());
    let account = ctx.db.fetch_user_account(ALICE).await.unwrap().unwrap();
    assert_eq!(account.balance.cents(), 500);

    let (status, _) = ctx.send(as_operator(mark_paid("no-such-order"), ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn admin_token() {
    let ctx = TestContext::with_admin_token(Some("s3cret-token")).await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    let (status, _) = ctx.send(as_operator(mark_paid(topup.order_id.as_str()), ADMIN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let req = as_operator(mark_paid(topup.order_id.as_str()), ADMIN).insert_header(("x-admin-token", "guess"));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let req = as_operator(mark_paid(topup.order_id.as_str()), ADMIN).insert_header(("x-admin-token", "s3cret-token"));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn operators_can_set_stock() {
    let ctx = TestContext::new().await;
    let set_stock = |stock: i64| {
        TestRequest::put().uri("/admin/products/mnk001/stock").set_json(value!({ "stock": stock }))
    };
    let (status, body) = ctx.send(as_operator(set_stock(3), ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["stock"], 3);
    let (status, _) = ctx.send(as_operator(set_stock(-1), ADMIN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = ctx.send(as_operator(set_stock(50), ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let product = ctx.db.fetch_product(&ProductId::from("mnk001")).await.unwrap().unwrap();
    assert_eq!(product.stock, 3);
    ctx.tear_down().await;
}
