use std::time::Duration;

use log::*;
use spg_common::{helpers::parse_boolean_flag, Secret};

pub const SANDBOX_BASE_URL: &str = "https://api-sandbox.nowpayments.io/v1";
pub const PRODUCTION_BASE_URL: &str = "https://api.nowpayments.io/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct NowPaymentsConfig {
    /// The API root, without a trailing slash.
    pub base_url: String,
    pub api_key: Secret<String>,
    /// The shared secret used to sign IPN callbacks.
    pub ipn_secret: Secret<String>,
    /// The public URL that NOWPayments should deliver IPN callbacks to.
    pub ipn_callback_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts for transient failures, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Each further retry doubles it.
    pub backoff: Duration,
}

impl Default for NowPaymentsConfig {
    fn default() -> Self {
        Self {
            base_url: SANDBOX_BASE_URL.to_string(),
            api_key: Secret::default(),
            ipn_secret: Secret::default(),
            ipn_callback_url: String::default(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl NowPaymentsConfig {
    pub fn new_from_env_or_default() -> Self {
        let sandbox = parse_boolean_flag(std::env::var("SPG_NOWPAYMENTS_SANDBOX").ok(), true);
        let base_url = std::env::var("SPG_NOWPAYMENTS_BASE_URL").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            let url = if sandbox { SANDBOX_BASE_URL } else { PRODUCTION_BASE_URL };
            info!("🪛️ SPG_NOWPAYMENTS_BASE_URL not set. Using {url}");
            url.to_string()
        });
        let api_key = Secret::new(std::env::var("SPG_NOWPAYMENTS_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SPG_NOWPAYMENTS_API_KEY not set. Invoices cannot be created until it is.");
            String::default()
        }));
        let ipn_secret = Secret::new(std::env::var("SPG_NOWPAYMENTS_IPN_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SPG_NOWPAYMENTS_IPN_SECRET not set. Every payment callback will be rejected.");
            String::default()
        }));
        let ipn_callback_url = std::env::var("SPG_IPN_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("🪛️ SPG_IPN_CALLBACK_URL not set. NOWPayments will not be able to notify us of payments.");
            String::default()
        });
        let timeout = std::env::var("SPG_NOWPAYMENTS_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for SPG_NOWPAYMENTS_TIMEOUT: {s}. {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let max_attempts = std::env::var("SPG_NOWPAYMENTS_RETRIES")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid value for SPG_NOWPAYMENTS_RETRIES: {s}. {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
            .max(1);
        Self { base_url, api_key, ipn_secret, ipn_callback_url, timeout, max_attempts, backoff: DEFAULT_BACKOFF }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Secret::new(api_key.to_string());
        self
    }

    pub fn with_ipn_secret(mut self, secret: &str) -> Self {
        self.ipn_secret = Secret::new(secret.to_string());
        self
    }

    pub fn with_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
