use std::{collections::HashSet, env, str::FromStr, time::Duration};

use log::*;
use nowpayments_tools::NowPaymentsConfig;
use spg_common::{
    helpers::{parse_boolean_flag, parse_list},
    Money,
    Secret,
};
use spg_engine::{db_types::UserId, order_objects::OrderFlowConfig};
use subtle::ConstantTimeEq;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_ADMIN_ID: UserId = UserId(7697204672);
const DEFAULT_REFERRAL_BONUS: Money = Money::from_units(1);
const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Users allowed to mark orders as paid by hand and to adjust stock.
    pub admin_ids: Vec<UserId>,
    /// When set, admin requests must also carry this value in the `x-admin-token` header.
    pub admin_api_token: Option<Secret<String>>,
    pub order_flow: OrderFlowConfig,
    pub referral_bonus: Money,
    /// Insert the default catalog at startup if the products table is empty.
    pub seed_catalog: bool,
    pub nowpayments: NowPaymentsConfig,
    /// If empty, notifications are only logged.
    pub telegram_bot_token: Secret<String>,
    /// The longest a single notification may take before it is abandoned.
    pub hook_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            admin_ids: vec![DEFAULT_ADMIN_ID],
            admin_api_token: None,
            order_flow: OrderFlowConfig::default(),
            referral_bonus: DEFAULT_REFERRAL_BONUS,
            seed_catalog: true,
            nowpayments: NowPaymentsConfig::default(),
            telegram_bot_token: Secret::default(),
            hook_timeout: DEFAULT_HOOK_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ SPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let admin_ids = configure_admin_ids();
        let admin_api_token = env::var("SPG_ADMIN_API_TOKEN").ok().filter(|s| !s.trim().is_empty()).map(Secret::new);
        if admin_api_token.is_none() {
            warn!("🪛️ SPG_ADMIN_API_TOKEN is not set. Admin requests are authorised by the x-operator-id header alone.");
        }
        let topup_amount = money_var("SPG_TOPUP_AMOUNT", OrderFlowConfig::default().topup_amount);
        let referral_bonus = money_var("SPG_REFERRAL_BONUS", DEFAULT_REFERRAL_BONUS);
        let reserve_stock = parse_boolean_flag(env::var("SPG_RESERVE_STOCK").ok(), false);
        if reserve_stock {
            info!("🪛️ Stock is reserved when orders are created");
        }
        let seed_catalog = parse_boolean_flag(env::var("SPG_SEED_CATALOG").ok(), true);
        let nowpayments = NowPaymentsConfig::new_from_env_or_default();
        let telegram_bot_token = Secret::new(env::var("SPG_TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
            info!("🪛️ SPG_TELEGRAM_BOT_TOKEN is not set. Notifications will only be logged.");
            String::default()
        }));
        Self {
            host,
            port,
            database_url,
            admin_ids,
            admin_api_token,
            order_flow: OrderFlowConfig { reserve_stock, topup_amount },
            referral_bonus,
            seed_catalog,
            nowpayments,
            telegram_bot_token,
            hook_timeout: DEFAULT_HOOK_TIMEOUT,
        }
    }

    pub fn operator_access(&self) -> OperatorAccess {
        OperatorAccess::new(self.admin_ids.iter().copied(), self.admin_api_token.clone())
    }
}

fn configure_admin_ids() -> Vec<UserId> {
    match env::var("SPG_ADMIN_IDS") {
        Ok(s) => {
            let (ids, rejects) = parse_list::<UserId>(&s);
            for r in rejects {
                warn!("🪛️ Ignoring invalid user id ({r}) in SPG_ADMIN_IDS");
            }
            if ids.is_empty() {
                warn!("🚨️ SPG_ADMIN_IDS is set but contains no valid ids. Nobody can use the admin endpoints.");
            } else {
                let list = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Operators: {list}");
            }
            ids
        },
        Err(_) => {
            info!("🪛️ SPG_ADMIN_IDS is not set. Using the default operator, {DEFAULT_ADMIN_ID}.");
            vec![DEFAULT_ADMIN_ID]
        },
    }
}

fn money_var(name: &str, default: Money) -> Money {
    env::var(name)
        .ok()
        .and_then(|s| {
            Money::from_str(&s)
                .map_err(|e| warn!("🪛️ Invalid value for {name}: {s}. {e}. Using the default, {default}."))
                .ok()
        })
        .filter(|m| {
            let positive = m.cents() > 0;
            if !positive {
                warn!("🪛️ {name} must be positive. Using the default, {default}.");
            }
            positive
        })
        .unwrap_or(default)
}

//-------------------------------------------------  OperatorAccess  ---------------------------------------------------
/// Who may call the admin endpoints. This is handed to the operator middleware as app data.
#[derive(Clone, Debug, Default)]
pub struct OperatorAccess {
    operators: HashSet<UserId>,
    api_token: Option<Secret<String>>,
}

impl OperatorAccess {
    pub fn new<I: IntoIterator<Item = UserId>>(operators: I, api_token: Option<Secret<String>>) -> Self {
        Self { operators: operators.into_iter().collect(), api_token }
    }

    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.operators.contains(&user_id)
    }

    /// True if no token is configured, or `token` matches it.
    pub fn token_matches(&self, token: Option<&str>) -> bool {
        match (&self.api_token, token) {
            (None, _) => true,
            (Some(expected), Some(given)) => expected.reveal().as_bytes().ct_eq(given.as_bytes()).into(),
            (Some(_), None) => false,
        }
    }

    pub fn operators(&self) -> impl Iterator<Item = UserId> + '_ {
        self.operators.iter().copied()
    }
}
