use actix_web::{
    body,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::{debug, error};
use nowpayments_tools::sign_ipn_payload;
use serde_json::Value;
use spg_common::Secret;
use spg_engine::{
    cart::MemoryCartStore,
    db_types::UserId,
    events::EventProducers,
    test_utils::{
        fake_gateway::FakeInvoiceGateway,
        prepare_env::{prepare_test_env, random_db_path},
    },
    AccountApi,
    CatalogApi,
    ManualOverrideApi,
    OrderFlowApi,
    PaymentGatewayDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    config::OperatorAccess,
    middleware::SignatureMiddlewareFactory,
    routes::{
        AddToCartRoute,
        CartRoute,
        CheckoutRoute,
        MarkPaidRoute,
        MyOrdersRoute,
        NowpaymentsWebhookRoute,
        ProductsRoute,
        RegisterUserRoute,
        RemoveFromCartRoute,
        TopUpRoute,
        UpdateStockRoute,
        UserProfileRoute,
    },
};

pub const ADMIN: UserId = UserId(7697204672);
pub const ALICE: UserId = UserId(1001);
pub const BOB: UserId = UserId(1002);
pub const IPN_SECRET: &str = "ipn-secret-for-tests";

/// Sends a single request to an app built by `configure` and returns the status and body.
///
/// Errors raised by middleware are rendered through their `ResponseError` impl, as the HTTP server would do.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = body::to_bytes(res.into_body())
        .await
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default();
    (status, body)
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}

/// A webhook request signed with `secret`.
pub fn signed_webhook(secret: &str, payload: &Value) -> TestRequest {
    let signature = sign_ipn_payload(&Secret::new(secret.to_string()), payload).expect("Failed to sign payload");
    TestRequest::post()
        .uri("/nowpayments/webhook")
        .insert_header(ContentType::json())
        .insert_header(("x-nowpayments-sig", signature))
        .set_payload(payload.to_string())
}

pub fn as_operator(req: TestRequest, user_id: UserId) -> TestRequest {
    req.insert_header(("x-operator-id", user_id.to_string()))
}

/// A fresh, seeded SQLite database behind the full set of routes, with a scripted invoice gateway.
pub struct TestContext {
    pub db: SqliteDatabase,
    pub gateway: FakeInvoiceGateway,
    pub carts: MemoryCartStore,
    pub access: OperatorAccess,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_admin_token(None).await
    }

    pub async fn with_admin_token(token: Option<&str>) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let access = OperatorAccess::new([ADMIN], token.map(|t| Secret::new(t.to_string())));
        Self { db, gateway: FakeInvoiceGateway::new(), carts: MemoryCartStore::new(), access }
    }

    pub fn orders_api(&self) -> OrderFlowApi<SqliteDatabase, FakeInvoiceGateway> {
        OrderFlowApi::new(self.db.clone(), self.gateway.clone(), EventProducers::default())
    }

    pub fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        let db = self.db.clone();
        let orders_api = self.orders_api();
        let carts = self.carts.clone();
        let access = self.access.clone();
        move |cfg: &mut ServiceConfig| {
            let override_api = ManualOverrideApi::new(db.clone(), EventProducers::default(), access.operators());
            cfg.app_data(web::Data::new(orders_api))
                .app_data(web::Data::new(AccountApi::new(db.clone())))
                .app_data(web::Data::new(CatalogApi::new(db)))
                .app_data(web::Data::new(override_api))
                .app_data(web::Data::new(carts))
                .app_data(web::Data::new(access))
                .service(
                    web::scope("/nowpayments")
                        .wrap(SignatureMiddlewareFactory::new(Secret::new(IPN_SECRET.to_string())))
                        .service(NowpaymentsWebhookRoute::<SqliteDatabase, FakeInvoiceGateway>::new()),
                )
                .service(
                    web::scope("/shop")
                        .service(ProductsRoute::<SqliteDatabase>::new())
                        .service(RegisterUserRoute::<SqliteDatabase>::new())
                        .service(UserProfileRoute::<SqliteDatabase>::new())
                        .service(CartRoute::<SqliteDatabase, FakeInvoiceGateway, MemoryCartStore>::new())
                        .service(AddToCartRoute::<MemoryCartStore>::new())
                        .service(RemoveFromCartRoute::<MemoryCartStore>::new())
                        .service(CheckoutRoute::<SqliteDatabase, FakeInvoiceGateway, MemoryCartStore>::new())
                        .service(TopUpRoute::<SqliteDatabase, FakeInvoiceGateway>::new())
                        .service(MyOrdersRoute::<SqliteDatabase>::new()),
                )
                .service(
                    web::scope("/admin")
                        .service(MarkPaidRoute::<SqliteDatabase>::new())
                        .service(UpdateStockRoute::<SqliteDatabase>::new()),
                );
        }
    }

    pub async fn send(&self, req: TestRequest) -> (StatusCode, String) {
        send_request(req, self.configure()).await
    }

    pub async fn tear_down(self) {
        let TestContext { mut db, .. } = self;
        let url = db.url().to_string();
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        let _ = Sqlite::drop_database(&url).await;
    }
}
