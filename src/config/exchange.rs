use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Target of the bot-creation request, stamped into its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub exchange: String,
    pub network: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            exchange: "binance".to_string(),
            network: "mainnet".to_string(),
        }
    }
}

pub fn load_exchange_config() -> ExchangeConfig {
    dotenv().ok(); // Load .env file if it exists, env vars may be set otherwise
    exchange_config_from(|key| env::var(key).ok())
}

/// Builds the config from any variable lookup, falling back to defaults.
pub fn exchange_config_from<F>(lookup: F) -> ExchangeConfig
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ExchangeConfig::default();
    let exchange = lookup("LADDER_EXCHANGE").unwrap_or(defaults.exchange);
    let network = lookup("LADDER_NETWORK").unwrap_or(defaults.network);

    ExchangeConfig { exchange, network }
}
