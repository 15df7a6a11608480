//! User notifications over the Telegram Bot API.
//!
//! Notifications are best-effort. They run from the engine's event hooks, outside the request that triggered them, and
//! failures are only logged.
use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use log::*;
use reqwest::Client;
use serde_json::json;
use spg_common::Secret;
use spg_engine::{
    db_types::UserId,
    events::{EventHandlers, EventHooks, OrderFailedEvent, OrderPaidEvent},
};
use thiserror::Error;

use crate::helpers::escape_html;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Could not initialize notifier: {0}")]
    Initialization(String),
    #[error("Could not deliver notification: {0}")]
    DeliveryFailed(String),
}

/// Delivers a short HTML message to a user.
pub trait Notifier: Clone + Send + Sync + 'static {
    fn notify(&self, chat_id: UserId, html: String) -> BoxFuture<'static, Result<(), NotifierError>>;
}

/// Sends messages with the bot's `sendMessage` method. Without a bot token, messages are only logged.
#[derive(Clone)]
pub struct TelegramNotifier {
    base_url: String,
    token: Secret<String>,
    client: Arc<Client>,
}

impl TelegramNotifier {
    pub fn new(token: Secret<String>) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifierError::Initialization(e.to_string()))?;
        Ok(Self { base_url: TELEGRAM_API_URL.to_string(), token, client: Arc::new(client) })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty()
    }

    pub async fn send_message(&self, chat_id: UserId, html: &str) -> Result<(), NotifierError> {
        if !self.is_enabled() {
            info!("📣️ [to {chat_id}] {html}");
            return Ok(());
        }
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token.reveal());
        let body = json!({ "chat_id": chat_id, "text": html, "parse_mode": "HTML" });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifierError::DeliveryFailed(e.without_url().to_string()))?;
        if response.status().is_success() {
            debug!("📣️ Notification delivered to {chat_id}");
            Ok(())
        } else {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            Err(NotifierError::DeliveryFailed(format!("HTTP {status}. {message}")))
        }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, chat_id: UserId, html: String) -> BoxFuture<'static, Result<(), NotifierError>> {
        let notifier = self.clone();
        Box::pin(async move { notifier.send_message(chat_id, &html).await })
    }
}

pub fn payment_confirmed_message(event: &OrderPaidEvent) -> String {
    let order_id = escape_html(event.order.order_id.as_str());
    match event.credited {
        Some(amount) => format!("✅ Plata pentru <code>{order_id}</code> confirmată. Sold alimentat cu {amount}."),
        None => format!("✅ Plata pentru <code>{order_id}</code> confirmată."),
    }
}

pub fn order_failed_message(event: &OrderFailedEvent) -> String {
    format!(
        "⚠️ Comanda <code>{}</code> a utilizatorului {} nu a putut fi facturată. {}",
        escape_html(event.order.order_id.as_str()),
        event.order.user_id,
        escape_html(&event.reason)
    )
}

/// Wires notifications into the engine's event hooks.
///
/// 1. OrderPaidEvent - the customer is told that their payment arrived.
/// 2. OrderFailedEvent - every operator is told that an invoice could not be created, since this is almost always a
///    gateway configuration problem.
pub fn create_notification_event_handlers<N: Notifier>(
    notifier: N,
    operators: Vec<UserId>,
    timeout: Duration,
) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let paid_notifier = notifier.clone();
    // --- On OrderPaid Handler ---
    hooks.on_order_paid(move |ev| {
        let user = ev.order.user_id;
        let message = payment_confirmed_message(&ev);
        let delivery = paid_notifier.notify(user, message);
        Box::pin(async move {
            if let Err(e) = delivery.await {
                warn!("📣️ Could not tell user {user} that order {} is paid. {e}", ev.order.order_id);
            }
        })
    });
    // --- On OrderFailed Handler ---
    hooks.on_order_failed(move |ev| {
        let message = order_failed_message(&ev);
        let deliveries = operators.iter().map(|op| (*op, notifier.notify(*op, message.clone()))).collect::<Vec<_>>();
        Box::pin(async move {
            for (op, delivery) in deliveries {
                if let Err(e) = delivery.await {
                    warn!("📣️ Could not tell operator {op} that order {} failed. {e}", ev.order.order_id);
                }
            }
        })
    });
    hooks.with_timeout(timeout);
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}
