use std::{collections::HashMap, fmt::Debug};

use log::*;
use spg_common::Money;

use crate::{
    cart::CartStore,
    db_types::{InvoiceDetails, NewOrder, Order, OrderId, UserId},
    events::{EventProducers, OrderFailedEvent, OrderPaidEvent, SettlementSource},
    helpers::{new_order_id, new_topup_order_id},
    spg_api::{
        checkout::{price_cart, PricedCart},
        errors::OrderFlowError,
        order_objects::{CheckoutResult, OrderFlowConfig},
    },
    traits::{ErrorTransition, InvoiceGateway, InvoiceRequest, PaidTransition, PaymentGatewayDatabase},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: checkout and top-up (which create `pending` orders and
/// request invoices for them), and settlement (which moves orders to `paid`).
///
/// ```text
///  checkout / top_up ──► pending ──► settle_payment ──► paid   (sticky)
///                           │
///                           └── invoice failure ──────► error  (terminal)
/// ```
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    config: OrderFlowConfig,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.config)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, config: OrderFlowConfig::default() }
    }

    pub fn with_config(mut self, config: OrderFlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: InvoiceGateway,
{
    /// Prices the user's current cart without creating anything.
    pub async fn price_cart<C: CartStore>(&self, carts: &C, user_id: UserId) -> Result<PricedCart, OrderFlowError> {
        let cart = carts.cart(user_id);
        let mut catalog = HashMap::with_capacity(cart.len());
        for (product_id, _) in cart.iter() {
            if let Some(product) = self.db.fetch_product(product_id).await? {
                catalog.insert(product_id.clone(), product);
            }
        }
        Ok(price_cart(&cart, &catalog)?)
    }

    /// Checks out the user's cart.
    ///
    /// 1. The cart is priced against the current catalog. Any validation failure is returned without writing anything.
    /// 2. A `pending` order is created from the priced snapshot (reserving stock if so configured).
    /// 3. An invoice is requested from the gateway and attached to the order.
    ///
    /// The cart is only cleared once the invoice exists. If the gateway fails, the order is moved to `error` and the
    /// cart is left as it was.
    pub async fn checkout<C: CartStore>(&self, carts: &C, user_id: UserId) -> Result<CheckoutResult, OrderFlowError> {
        let priced = self.price_cart(carts, user_id).await?;
        let order_id = new_order_id();
        debug!("🛒️ Checking out {} lines for user {user_id} as order [{order_id}]. Total {}", priced.items.len(), priced.total);
        let order = NewOrder::new(order_id.clone(), user_id, priced.items);
        let order = self.db.insert_order(order, self.config.reserve_stock).await?;
        let description = format!("Order {order_id}");
        let result = self.request_invoice(order, description).await?;
        carts.clear(user_id);
        info!("🛒️ Order [{order_id}] for user {user_id} is awaiting payment of {}", result.order.total_amount);
        Ok(result)
    }

    /// Creates a wallet top-up order for the configured top-up amount and requests an invoice for it.
    pub async fn top_up(&self, user_id: UserId) -> Result<CheckoutResult, OrderFlowError> {
        self.top_up_amount(user_id, self.config.topup_amount).await
    }

    pub async fn top_up_amount(&self, user_id: UserId, amount: Money) -> Result<CheckoutResult, OrderFlowError> {
        if amount.cents() <= 0 {
            return Err(OrderFlowError::InvalidRequest(format!("Top-up amount must be positive, got {amount}")));
        }
        let order_id = new_topup_order_id();
        let order = NewOrder::topup(order_id.clone(), user_id, amount);
        // Top-ups have no catalog lines, so there is never stock to reserve.
        let order = self.db.insert_order(order, false).await?;
        let description = format!("Balance top-up {order_id}");
        let result = self.request_invoice(order, description).await?;
        info!("💰️ Top-up [{order_id}] of {amount} for user {user_id} is awaiting payment");
        Ok(result)
    }

    /// Requests an invoice for a freshly inserted `pending` order and stores it. Whichever step fails, the order is
    /// moved to `error` so that it never lingers as an unpayable `pending` order.
    async fn request_invoice(&self, order: Order, description: String) -> Result<CheckoutResult, OrderFlowError> {
        let order_id = order.order_id.clone();
        let request = InvoiceRequest { order_id: order_id.clone(), amount: order.total_amount, description };
        let invoice = match self.gateway.create_invoice(&request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                error!("🧾️ Could not create an invoice for order [{order_id}]. {e}");
                self.fail_order(&order_id, e.to_string()).await;
                return Err(OrderFlowError::InvoiceCreationFailed { order_id, source: e });
            },
        };
        debug!("🧾️ Invoice {:?} created for order [{order_id}]", invoice.invoice_id);
        let details = InvoiceDetails { invoice_id: invoice.invoice_id, payment_url: invoice.payment_url };
        match self.db.attach_invoice(&order_id, details).await {
            Ok(order) => Ok(CheckoutResult::from(order)),
            Err(e) => {
                error!("🧾️ Invoice for order [{order_id}] was created, but could not be stored. {e}");
                self.fail_order(&order_id, format!("The invoice could not be stored. {e}")).await;
                Err(e.into())
            },
        }
    }

    async fn fail_order(&self, order_id: &OrderId, reason: String) {
        match self.db.mark_error(order_id).await {
            Ok(ErrorTransition::Transitioned(order)) => self.call_order_failed_hook(order, reason).await,
            Ok(t) => warn!("🧾️ Order [{order_id}] was already {} when its invoice failed", t.order().status),
            Err(db_err) => error!("🧾️ Could not mark order [{order_id}] as failed. {db_err}"),
        }
    }

    /// Applies a confirmed payment to the order.
    ///
    /// This is idempotent. Only the call that actually moves the order from `pending` to `paid` credits top-up
    /// balances and fires the order-paid hook. Repeat calls return [`PaidTransition::AlreadyPaid`].
    pub async fn settle_payment(
        &self,
        order_id: &OrderId,
        source: SettlementSource,
    ) -> Result<PaidTransition, OrderFlowError> {
        let transition = self.db.mark_paid(order_id).await?;
        match &transition {
            PaidTransition::Transitioned { order, credited } => {
                info!("💸️ Order [{order_id}] is paid ({source:?})");
                self.call_order_paid_hook(order.clone(), *credited, source).await;
            },
            PaidTransition::AlreadyPaid(_) => {
                debug!("💸️ Order [{order_id}] was already paid. Nothing to do");
            },
        }
        Ok(transition)
    }

    async fn call_order_paid_hook(&self, order: Order, credited: Option<Money>, source: SettlementSource) {
        for emitter in &self.producers.order_paid_producer {
            debug!("💸️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone(), credited, source);
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_failed_hook(&self, order: Order, reason: String) {
        for emitter in &self.producers.order_failed_producer {
            debug!("🧾️ Notifying order failed hook subscribers");
            let event = OrderFailedEvent::new(order.clone(), reason.clone());
            emitter.publish_event(event).await;
        }
    }
}
