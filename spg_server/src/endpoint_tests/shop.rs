use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json as value;
use spg_engine::{cart::CartStore, InvoiceError};

use super::helpers::{json, TestContext, ALICE, BOB};

fn add_item(user: &str, product_id: &str) -> TestRequest {
    TestRequest::post().uri(&format!("/shop/cart/{user}/items")).set_json(value!({ "product_id": product_id }))
}

#[actix_web::test]
async fn browse_the_catalog() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(TestRequest::get().uri("/shop/products")).await;
    assert_eq!(status, StatusCode::OK);
    let products = json(&body);
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 7);
    assert!(products.iter().any(|p| p["id"] == "apl001" && p["price"] == 150));
    ctx.tear_down().await;
}

#[actix_web::test]
async fn cart_and_checkout() {
    let ctx = TestContext::new().await;
    for id in ["apl001", "ban001", "apl001"] {
        let (status, _) = ctx.send(add_item("1001", id)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = ctx.send(TestRequest::get().uri("/shop/cart/1001")).await;
    assert_eq!(status, StatusCode::OK);
    let cart = json(&body);
    assert_eq!(cart["total"], 540);
    assert!(cart["problem"].is_null());
    assert_eq!(cart["lines"].as_array().unwrap().len(), 2);

    let (status, body) = ctx.send(TestRequest::post().uri("/shop/checkout/1001")).await;
    assert_eq!(status, StatusCode::OK);
    let checkout = json(&body);
    assert_eq!(checkout["total"], 540);
    assert_eq!(checkout["invoice_id"], "INV1");
    assert_eq!(checkout["payment_url"], "https://pay/INV1");
    assert!(ctx.carts.cart(ALICE).is_empty(), "The cart is cleared once the invoice exists");
    let requests = ctx.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].order_id.as_str(), checkout["order_id"].as_str().unwrap());

    let (status, body) = ctx.send(TestRequest::get().uri("/shop/orders/1001")).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    assert_eq!(orders[0]["order_id"], checkout["order_id"]);
    assert_eq!(orders[0]["status"], "pending");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn removing_items() {
    let ctx = TestContext::new().await;
    ctx.send(add_item("1001", "per001")).await;
    let (status, _) = ctx.send(TestRequest::delete().uri("/shop/cart/1001/items/per001")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = ctx.send(TestRequest::delete().uri("/shop/cart/1001/items/per001")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. per001 is not in the cart of user 1001"}"#);
    let (_, body) = ctx.send(TestRequest::get().uri("/shop/cart/1001")).await;
    let cart = json(&body);
    assert!(cart["lines"].as_array().unwrap().is_empty());
    assert!(cart["total"].is_null());
    ctx.tear_down().await;
}

#[actix_web::test]
async fn checkout_rejections_create_nothing() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.send(TestRequest::post().uri("/shop/checkout/1001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "An empty cart cannot be checked out");

    // Only 15 melons in stock
    for _ in 0..16 {
        ctx.send(add_item("1001", "pep001")).await;
    }
    let (_, body) = ctx.send(TestRequest::get().uri("/shop/cart/1001")).await;
    let cart = json(&body);
    assert!(cart["total"].is_null());
    assert!(cart["problem"].is_string());
    let (status, _) = ctx.send(TestRequest::post().uri("/shop/checkout/1001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.carts.cart(ALICE).len(), 1, "A rejected checkout leaves the cart alone");
    assert!(ctx.gateway.requests().is_empty());

    let (_, body) = ctx.send(TestRequest::get().uri("/shop/orders/1001")).await;
    assert_eq!(body, "[]");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn rejected_gateway_credentials() {
    let ctx = TestContext::new().await;
    ctx.gateway.push_response(Err(InvoiceError::AuthenticationRejected(401)));
    ctx.send(add_item("1001", "str001")).await;
    let (status, body) = ctx.send(TestRequest::post().uri("/shop/checkout/1001")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        r#"{"error":"Payment provider error. The payment provider is not configured correctly. Please contact the shop administrator."}"#
    );
    assert_eq!(ctx.carts.cart(ALICE).len(), 1);
    let (_, body) = ctx.send(TestRequest::get().uri("/shop/orders/1001")).await;
    let orders = json(&body);
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["status"], "error");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn top_up() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(TestRequest::post().uri("/shop/topup/1001")).await;
    assert_eq!(status, StatusCode::OK);
    let topup = json(&body);
    assert!(topup["order_id"].as_str().unwrap().starts_with("TOPUP_"));
    assert_eq!(topup["total"], 500);
    assert_eq!(topup["invoice_id"], "INV1");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn registration_and_referrals() {
    let ctx = TestContext::new().await;
    let register = |body: serde_json::Value| TestRequest::post().uri("/shop/users").set_json(body);
    let (status, body) = ctx.send(register(value!({ "user_id": 1001, "username": "ana" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["account"]["balance"], 0);

    let (status, _) = ctx.send(register(value!({ "user_id": BOB.0, "referred_by": ALICE.0 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    // Registering again never pays the bonus twice
    let (status, body) = ctx.send(register(value!({ "user_id": BOB.0, "referred_by": ALICE.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["created"], false);

    let (status, body) = ctx.send(TestRequest::get().uri("/shop/users/1001")).await;
    assert_eq!(status, StatusCode::OK);
    let alice = json(&body);
    assert_eq!(alice["username"], "ana");
    assert_eq!(alice["referrals_count"], 1);
    assert_eq!(alice["balance"], 100);
    ctx.tear_down().await;
}
