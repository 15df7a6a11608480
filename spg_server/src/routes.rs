//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use nowpayments_tools::IpnNotification;
use serde_json::json;
use spg_engine::{
    cart::CartStore,
    db_types::{NewUser, OrderId, ProductId, UserId},
    events::SettlementSource,
    AccountApi,
    AccountManagement,
    CatalogApi,
    CatalogManagement,
    InvoiceGateway,
    ManualOverrideApi,
    OrderFlowApi,
    OrderFlowError,
    PaidTransition,
    PaymentGatewayDatabase,
    RECENT_ORDERS_LIMIT,
};

use crate::{
    data_objects::{
        AddToCartParams,
        CartLine,
        CartView,
        CheckoutResponse,
        JsonResponse,
        MarkPaidResponse,
        RegisterUserParams,
        UpdateStockParams,
        WebhookAck,
    },
    errors::ServerError,
    middleware::{OperatorId, VerifiedPayload},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where operator_only) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::OperatorMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(nowpayments_webhook => Post "/webhook" impl PaymentGatewayDatabase, InvoiceGateway);
/// Route handler for NOWPayments IPN callbacks.
///
/// The signature middleware has already verified the body by the time this runs. Callbacks are always acknowledged
/// with `{"ok": true}`, including those for unsettled statuses, unknown orders and orders in `error`, since there is
/// nothing the provider could do differently on a retry. Storage failures are the exception: they answer with a 500 so
/// that the provider tries again later.
pub async fn nowpayments_webhook<B, G>(
    payload: web::ReqData<VerifiedPayload>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: InvoiceGateway,
{
    let notification = IpnNotification::from_payload(&payload.0);
    debug!("💻️ IPN callback received: {notification:?}");
    if !notification.is_settled() {
        debug!("💻️ Payment status {:?} is not a settlement. Ignoring", notification.payment_status);
        return Ok(HttpResponse::Ok().json(WebhookAck::ok()));
    }
    let Some(reference) = notification.order_reference else {
        warn!("💻️ Settled IPN callback carried no order reference. Ignoring. {}", payload.0);
        return Ok(HttpResponse::Ok().json(WebhookAck::ok()));
    };
    let order_id = OrderId::from(reference);
    match api.settle_payment(&order_id, SettlementSource::Webhook).await {
        Ok(PaidTransition::Transitioned { credited, .. }) => {
            info!("💻️ Order {order_id} settled by IPN callback. Credited: {credited:?}");
        },
        Ok(PaidTransition::AlreadyPaid(_)) => {
            debug!("💻️ Duplicate IPN callback for order {order_id}");
        },
        Err(OrderFlowError::InvalidTransition { from, .. }) => {
            warn!("💻️ IPN callback for order {order_id} cannot be applied (order is {from}). Ignoring");
        },
        Err(OrderFlowError::DatabaseError(e)) => {
            error!("💻️ Could not settle order {order_id}. {e}");
            return Err(ServerError::BackendError(e));
        },
        Err(e) => {
            warn!("💻️ IPN callback for order {order_id} was not applied. {e}");
        },
    }
    Ok(HttpResponse::Ok().json(WebhookAck::ok()))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement);
pub async fn products<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET products");
    let products = api.products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(update_stock => Put "/products/{product_id}/stock" impl CatalogManagement where operator_only);
pub async fn update_stock<B: CatalogManagement>(
    path: web::Path<ProductId>,
    body: web::Json<UpdateStockParams>,
    operator: web::ReqData<OperatorId>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let stock = body.into_inner().stock;
    info!("💻️ Operator {} is setting the stock of {product_id} to {stock}", operator.0);
    let product = api.set_stock(&product_id, stock).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register_user => Post "/users" impl AccountManagement);
pub async fn register_user<B: AccountManagement>(
    body: web::Json<RegisterUserParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ Registering user {}", params.user_id);
    let mut user = NewUser::new(params.user_id);
    user.username = params.username;
    user.referred_by = params.referred_by;
    let (account, created) = api.register_user(user).await?;
    let response = if created { HttpResponse::Created() } else { HttpResponse::Ok() }
        .json(json!({ "account": account, "created": created }));
    Ok(response)
}

route!(user_profile => Get "/users/{user_id}" impl AccountManagement);
pub async fn user_profile<B: AccountManagement>(
    path: web::Path<UserId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ GET profile for {user_id}");
    let account = api.user(user_id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("User {user_id}")))?;
    Ok(HttpResponse::Ok().json(account))
}

route!(my_orders => Get "/orders/{user_id}" impl AccountManagement);
pub async fn my_orders<B: AccountManagement>(
    path: web::Path<UserId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ GET orders for {user_id}");
    let orders = api.orders_for_user(user_id, Some(RECENT_ORDERS_LIMIT)).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(cart => Get "/cart/{user_id}" impl PaymentGatewayDatabase, InvoiceGateway, CartStore);
pub async fn cart<B, G, C>(
    path: web::Path<UserId>,
    api: web::Data<OrderFlowApi<B, G>>,
    carts: web::Data<C>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: InvoiceGateway,
    C: CartStore,
{
    let user_id = path.into_inner();
    let cart = carts.cart(user_id);
    let view = if cart.is_empty() {
        CartView::new(user_id, &cart)
    } else {
        let quote = match api.price_cart(carts.get_ref(), user_id).await {
            Ok(priced) => Ok(priced),
            Err(OrderFlowError::CheckoutError(e)) => Err(e.to_string()),
            Err(e) => return Err(e.into()),
        };
        CartView::new(user_id, &cart).with_quote(quote)
    };
    Ok(HttpResponse::Ok().json(view))
}

route!(add_to_cart => Post "/cart/{user_id}/items" impl CartStore);
pub async fn add_to_cart<C: CartStore>(
    path: web::Path<UserId>,
    body: web::Json<AddToCartParams>,
    carts: web::Data<C>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let product_id = body.into_inner().product_id;
    let quantity = carts.add_item(user_id, product_id.clone());
    debug!("💻️ User {user_id} now has {quantity} x {product_id} in their cart");
    Ok(HttpResponse::Ok().json(CartLine { product_id, quantity }))
}

route!(remove_from_cart => Delete "/cart/{user_id}/items/{product_id}" impl CartStore);
pub async fn remove_from_cart<C: CartStore>(
    path: web::Path<(UserId, ProductId)>,
    carts: web::Data<C>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, product_id) = path.into_inner();
    if carts.remove_item(user_id, &product_id) {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Removed {product_id} from the cart"))))
    } else {
        Err(ServerError::NoRecordFound(format!("{product_id} is not in the cart of user {user_id}")))
    }
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout/{user_id}" impl PaymentGatewayDatabase, InvoiceGateway, CartStore);
pub async fn checkout<B, G, C>(
    path: web::Path<UserId>,
    api: web::Data<OrderFlowApi<B, G>>,
    carts: web::Data<C>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: InvoiceGateway,
    C: CartStore,
{
    let user_id = path.into_inner();
    debug!("💻️ Checkout requested by {user_id}");
    let result = api.checkout(carts.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(result)))
}

route!(top_up => Post "/topup/{user_id}" impl PaymentGatewayDatabase, InvoiceGateway);
pub async fn top_up<B, G>(
    path: web::Path<UserId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: InvoiceGateway,
{
    let user_id = path.into_inner();
    debug!("💻️ Top-up requested by {user_id}");
    let result = api.top_up(user_id).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(result)))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(mark_paid => Post "/orders/{order_id}/mark_paid" impl PaymentGatewayDatabase where operator_only);
pub async fn mark_paid<B: PaymentGatewayDatabase>(
    path: web::Path<OrderId>,
    operator: web::ReqData<OperatorId>,
    api: web::Data<ManualOverrideApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let transition = api.force_mark_paid(operator.0, &order_id).await?;
    let response = MarkPaidResponse {
        order_id,
        transitioned: transition.is_transitioned(),
        credited: transition.credited(),
    };
    Ok(HttpResponse::Ok().json(response))
}
