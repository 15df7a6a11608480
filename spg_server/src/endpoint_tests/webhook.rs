use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
};
use serde_json::json as value;
use spg_common::Money;
use spg_engine::{
    db_types::{OrderId, OrderStatusType},
    AccountManagement,
};

use super::helpers::{signed_webhook, TestContext, ALICE, IPN_SECRET};

fn settled(order_id: &OrderId) -> serde_json::Value {
    value!({
        "payment_id": 5077125051u64,
        "payment_status": "finished",
        "order_id": order_id.as_str(),
        "price_amount": 5,
        "price_currency": "eur",
        "pay_currency": "usdttrc20",
        "order_description": "Balance top-up"
    })
}

async fn status_of(ctx: &TestContext, order_id: &OrderId) -> OrderStatusType {
    ctx.db.fetch_order_by_order_id(order_id).await.unwrap().expect("order should exist").status
}

#[actix_web::test]
async fn missing_signature() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    let req = TestRequest::post()
        .uri("/nowpayments/webhook")
        .insert_header(ContentType::json())
        .set_payload(settled(&topup.order_id).to_string());
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Missing signature header"}"#);
    assert_eq!(status_of(&ctx, &topup.order_id).await, OrderStatusType::Pending);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn invalid_signatures_change_nothing() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    let (status, body) = ctx.send(signed_webhook("not-the-secret", &settled(&topup.order_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid signature"}"#);

    // A valid signature over a different body
    let mut tampered = settled(&topup.order_id);
    tampered["price_amount"] = value!(500);
    let req = signed_webhook(IPN_SECRET, &settled(&topup.order_id)).set_payload(tampered.to_string());
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/nowpayments/webhook")
        .insert_header(("x-nowpayments-sig", "zz-not-hex"))
        .set_payload(settled(&topup.order_id).to_string());
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(status_of(&ctx, &topup.order_id).await, OrderStatusType::Pending);
    let account = ctx.db.fetch_user_account(ALICE).await.unwrap().unwrap();
    assert_eq!(account.balance, Money::default());
    ctx.tear_down().await;
}

#[actix_web::test]
async fn duplicate_callbacks_credit_a_topup_once() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    for _ in 0..2 {
        let (status, body) = ctx.send(signed_webhook(IPN_SECRET, &settled(&topup.order_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
    }
    assert_eq!(status_of(&ctx, &topup.order_id).await, OrderStatusType::Paid);
    let account = ctx.db.fetch_user_account(ALICE).await.unwrap().unwrap();
    assert_eq!(account.balance, Money::from_units(5));
    ctx.tear_down().await;
}

#[actix_web::test]
async fn alternative_signature_header() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    let payload = settled(&topup.order_id);
    let signature = nowpayments_tools::sign_ipn_payload(&spg_common::Secret::new(IPN_SECRET.to_string()), &payload)
        .unwrap()
        .to_uppercase();
    let req = TestRequest::post()
        .uri("/nowpayments/webhook")
        .insert_header(("x-signature", signature))
        .set_payload(payload.to_string());
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_of(&ctx, &topup.order_id).await, OrderStatusType::Paid);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn unsettled_statuses_are_acknowledged() {
    let ctx = TestContext::new().await;
    let topup = ctx.orders_api().top_up(ALICE).await.unwrap();
    for status in ["waiting", "confirming", "partially_paid", "expired"] {
        let mut payload = settled(&topup.order_id);
        payload["payment_status"] = value!(status);
        let (code, body) = ctx.send(signed_webhook(IPN_SECRET, &payload)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
    }
    assert_eq!(status_of(&ctx, &topup.order_id).await, OrderStatusType::Pending);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn unknown_and_failed_orders_are_acknowledged() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(signed_webhook(IPN_SECRET, &settled(&"no-such-order".into()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);

    ctx.gateway.push_response(Err(spg_engine::InvoiceError::Unavailable("timeout".into())));
    let failed = ctx.orders_api().top_up(ALICE).await.unwrap_err();
    let spg_engine::OrderFlowError::InvoiceCreationFailed { order_id, .. } = failed else {
        panic!("Expected an invoice failure")
    };
    let (status, _) = ctx.send(signed_webhook(IPN_SECRET, &settled(&order_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_of(&ctx, &order_id).await, OrderStatusType::Error, "Failed orders stay failed");
    let account = ctx.db.fetch_user_account(ALICE).await.unwrap().unwrap();
    assert_eq!(account.balance, Money::default());
    ctx.tear_down().await;
}
