use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use spg_common::Money;
use spg_engine::{
    db_types::{LineItem, Order, OrderStatusType, UserAccount, UserId},
    AccountApi,
    AccountApiError,
    RECENT_ORDERS_LIMIT,
};

use super::{
    helpers::{json, send_request},
    mocks::MockAccountManager,
};
use crate::routes::{MyOrdersRoute, RegisterUserRoute, UserProfileRoute};

fn account(user_id: i64) -> UserAccount {
    UserAccount {
        user_id: UserId(user_id),
        username: Some("ana".into()),
        referred_by: None,
        balance: Money::from_cents(250),
        referrals_count: 2,
        first_seen: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
    }
}

fn order(id: &str) -> Order {
    let created = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
    Order {
        order_id: id.into(),
        user_id: UserId(1001),
        items: vec![LineItem {
            product_id: "apl001".into(),
            name: "Măr".into(),
            quantity: 2,
            unit_price: Money::from_cents(150),
        }],
        total_amount: Money::from_cents(300),
        status: OrderStatusType::Pending,
        invoice_id: Some("INV1".into()),
        payment_url: Some("https://pay/INV1".into()),
        created_at: created,
        updated_at: created,
    }
}

fn configure_with(accounts: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = AccountApi::new(accounts).with_referral_bonus(Money::from_cents(150));
        cfg.service(UserProfileRoute::<MockAccountManager>::new())
            .service(MyOrdersRoute::<MockAccountManager>::new())
            .service(RegisterUserRoute::<MockAccountManager>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn fetch_profile() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_account().withf(|id| *id == UserId(1001)).returning(|id| Ok(Some(account(id.0))));
    let (status, body) = send_request(TestRequest::get().uri("/users/1001"), configure_with(accounts)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["user_id"], 1001);
    assert_eq!(body["balance"], 250);
    assert_eq!(body["referrals_count"], 2);
}

#[actix_web::test]
async fn fetch_missing_profile() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_user_account().returning(|_| Ok(None));
    let (status, body) = send_request(TestRequest::get().uri("/users/999"), configure_with(accounts)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. User 999"}"#);
}

#[actix_web::test]
async fn profile_ids_must_be_numeric() {
    let _ = env_logger::try_init().ok();
    let accounts = MockAccountManager::new();
    let (status, _) = send_request(TestRequest::get().uri("/users/alice"), configure_with(accounts)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_recent_orders() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts
        .expect_fetch_orders_for_user()
        .withf(|id, limit| *id == UserId(1001) && *limit == RECENT_ORDERS_LIMIT)
        .times(1)
        .returning(|_, _| Ok(vec![order("b2"), order("a1")]));
    let (status, body) = send_request(TestRequest::get().uri("/orders/1001"), configure_with(accounts)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["order_id"], "b2");
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["total_amount"], 300);
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
}

#[actix_web::test]
async fn register_passes_the_referral_bonus() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts
        .expect_register_user()
        .withf(|user, bonus| {
            user.user_id == UserId(1002) &&
                user.referred_by == Some(UserId(1001)) &&
                user.username.as_deref() == Some("bob") &&
                *bonus == Money::from_cents(150)
        })
        .times(1)
        .returning(|user, _| {
            let mut account = account(user.user_id.0);
            account.username = user.username;
            account.referred_by = user.referred_by;
            Ok((account, true))
        });
    let req = TestRequest::post().uri("/users").set_json(serde_json::json!({
        "user_id": 1002,
        "username": "bob",
        "referred_by": 1001
    }));
    let (status, body) = send_request(req, configure_with(accounts)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = json(&body);
    assert_eq!(body["created"], true);
    assert_eq!(body["account"]["referred_by"], 1001);
}

#[actix_web::test]
async fn registering_twice_is_not_an_error() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_register_user().returning(|user, _| Ok((account(user.user_id.0), false)));
    let req = TestRequest::post().uri("/users").set_json(serde_json::json!({ "user_id": 1001 }));
    let (status, body) = send_request(req, configure_with(accounts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["created"], false);
}

#[actix_web::test]
async fn database_errors_are_500s() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_orders_for_user().returning(|_, _| Err(AccountApiError::DatabaseError("disk full".into())));
    let (status, body) = send_request(TestRequest::get().uri("/orders/1001"), configure_with(accounts)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"An error occurred on the backend of the server. disk full"}"#);
}
