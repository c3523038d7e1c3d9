//! Process configuration, read once from the environment at start-up

use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// How customers pay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMode {
    /// No provider; orders are finalized as soon as they are created
    Simulated,
    Stripe {
        secret_key: String,
        webhook_secret: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub admin_api_key: String,
    pub payment_mode: PaymentMode,
    pub public_base_url: String,
    pub currency: String,
    /// Public requests allowed per client IP in each window
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `load` uses the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let payment_mode = match try_load::<String>(&get, "PAYMENT_MODE", "simulated")?
            .to_lowercase()
            .as_str()
        {
            "simulated" => PaymentMode::Simulated,
            "stripe" => PaymentMode::Stripe {
                secret_key: require("STRIPE_SECRET_KEY")?,
                webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "PAYMENT_MODE",
                    message: format!("expected simulated or stripe, got {}", other),
                });
            }
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            bind_addr: try_load(&get, "BIND_ADDR", "0.0.0.0:3000")?,
            admin_api_key: require("ADMIN_API_KEY")?,
            payment_mode,
            public_base_url: try_load(&get, "PUBLIC_BASE_URL", "http://localhost:3000")?,
            currency: try_load::<String>(&get, "CURRENCY", "eur")?.to_lowercase(),
            rate_limit_max: try_load(&get, "RATE_LIMIT_MAX", "60")?,
            rate_limit_window_secs: try_load(&get, "RATE_LIMIT_WINDOW_SECS", "60")?,
        })
    }
}

fn try_load<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = get(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    debug!(key, "Loaded configuration value");

    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
