use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base_url: String,
    pub database_url: String,
    pub request_timeout: Duration,
    pub cart_stale: Duration,
    pub address_stale: Duration,
    pub catalog_stale: Duration,
    pub delivery_charges: f64,
    pub payment_redirect_url: String,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: try_load("PORT", 5173),
            api_base_url: try_load("API_BASE_URL", "http://localhost:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            database_url: try_load("DATABASE_URL", "sqlite://client.db".to_string()),
            request_timeout: Duration::from_secs(try_load("REQUEST_TIMEOUT_SECS", 30)),
            cart_stale: Duration::from_secs(try_load("CART_STALE_SECS", 60)),
            address_stale: Duration::from_secs(try_load("ADDRESS_STALE_SECS", 300)),
            catalog_stale: Duration::from_secs(try_load("CATALOG_STALE_SECS", 600)),
            delivery_charges: try_load("DELIVERY_CHARGES", 40.0),
            payment_redirect_url: try_load("PAYMENT_REDIRECT_URL", "https://checkout.stripe.com/c/pay/".to_string()),
        }
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5173,
            api_base_url: "http://localhost:8000".to_string(),
            database_url: "sqlite://client.db".to_string(),
            request_timeout: Duration::from_secs(30),
            cart_stale: Duration::from_secs(60),
            address_stale: Duration::from_secs(300),
            catalog_stale: Duration::from_secs(600),
            delivery_charges: 40.0,
            payment_redirect_url: "https://checkout.stripe.com/c/pay/".to_string(),
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(raw) => raw,
        Err(_) => {
            info!("{key} not set, using default: {default}");
            return default;
        }
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}
