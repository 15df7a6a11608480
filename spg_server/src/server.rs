use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use spg_engine::{
    cart::MemoryCartStore,
    events::EventProducers,
    helpers::default_catalog,
    AccountApi,
    CatalogApi,
    ManualOverrideApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{
        nowpayments::NowPaymentsGateway,
        telegram::{create_notification_event_handlers, TelegramNotifier},
    },
    middleware::SignatureMiddlewareFactory,
    routes::{
        health,
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

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::create_if_missing(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    if config.seed_catalog {
        let count = CatalogApi::new(db.clone())
            .seed_if_empty(&default_catalog())
            .await
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        if count > 0 {
            info!("🚀️ Seeded the catalog with {count} products");
        }
    }
    let notifier = TelegramNotifier::new(config.telegram_bot_token.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers(notifier, config.admin_ids.clone(), config.hook_timeout);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = NowPaymentsGateway::new(config.nowpayments.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    // Carts live in memory and must be shared by every worker
    let carts = MemoryCartStore::new();
    let access = config.operator_access();
    let ipn_secret = config.nowpayments.ipn_secret.clone();
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_config(config.order_flow.clone());
        let accounts_api = AccountApi::new(db.clone()).with_referral_bonus(config.referral_bonus);
        let catalog_api = CatalogApi::new(db.clone());
        let override_api = ManualOverrideApi::new(db.clone(), producers.clone(), access.operators());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(override_api))
            .app_data(web::Data::new(carts.clone()))
            .app_data(web::Data::new(access.clone()));
        let webhook_scope = web::scope("/nowpayments")
            .wrap(SignatureMiddlewareFactory::new(ipn_secret.clone()))
            .service(NowpaymentsWebhookRoute::<SqliteDatabase, NowPaymentsGateway>::new());
        let shop_scope = web::scope("/shop")
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(RegisterUserRoute::<SqliteDatabase>::new())
            .service(UserProfileRoute::<SqliteDatabase>::new())
            .service(CartRoute::<SqliteDatabase, NowPaymentsGateway, MemoryCartStore>::new())
            .service(AddToCartRoute::<MemoryCartStore>::new())
            .service(RemoveFromCartRoute::<MemoryCartStore>::new())
            .service(CheckoutRoute::<SqliteDatabase, NowPaymentsGateway, MemoryCartStore>::new())
            .service(TopUpRoute::<SqliteDatabase, NowPaymentsGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new());
        let admin_scope = web::scope("/admin")
            .service(MarkPaidRoute::<SqliteDatabase>::new())
            .service(UpdateStockRoute::<SqliteDatabase>::new());
        app.service(health).service(webhook_scope).service(shop_scope).service(admin_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?;
    Ok(srv.run())
}
