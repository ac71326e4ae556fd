//! First-entry price resolution.

use anyhow::{anyhow, Result};
use std::collections::HashMap;

use crate::constants::{DEFAULT_FALLBACK_PRICE, FALLBACK_PRICES};

/// Source of live quotes, e.g. an exchange ticker endpoint.
pub trait PriceFeed {
    fn last_price(&self, symbol: &str) -> Result<f64>;
}

/// Fixed quotes. Backs the `--price` CLI override and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticPriceFeed {
    prices: HashMap<String, f64>,
}

impl StaticPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_uppercase(), price);
        self
    }
}

impl PriceFeed for StaticPriceFeed {
    fn last_price(&self, symbol: &str) -> Result<f64> {
        self.prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| anyhow!("No quote for {}", symbol))
    }
}

/// Static fallback for `symbol`, or [`DEFAULT_FALLBACK_PRICE`].
pub fn fallback_price(symbol: &str) -> f64 {
    let symbol = symbol.to_uppercase();
    FALLBACK_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_FALLBACK_PRICE)
}

/// Picks the first entry price for `symbol`.
///
/// Order: live quote, last known price, static table, default. Feed errors are
/// logged and never propagated.
pub fn resolve_entry_price(
    feed: Option<&dyn PriceFeed>,
    symbol: &str,
    last_known: Option<f64>,
) -> f64 {
    if let Some(feed) = feed {
        match feed.last_price(symbol) {
            Ok(price) if price > 0.0 && price.is_finite() => return price,
            Ok(price) => log::warn!("Ignoring invalid quote {} for {}", price, symbol),
            Err(e) => log::warn!("Price lookup failed for {}: {}", symbol, e),
        }
    }
    match last_known {
        Some(price) if price > 0.0 && price.is_finite() => price,
        _ => {
            let price = fallback_price(symbol);
            log::info!("Using fallback price {} for {}", price, symbol);
            price
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingFeed;

    impl PriceFeed for FailingFeed {
        fn last_price(&self, _symbol: &str) -> Result<f64> {
            Err(anyhow!("connection refused"))
        }
    }

    #[test]
    fn test_live_quote_wins() {
        let feed = StaticPriceFeed::new().with_price("ethusdt", 2500.0);
        assert_eq!(resolve_entry_price(Some(&feed), "ETHUSDT", Some(3000.0)), 2500.0);
    }

    #[test]
    fn test_feed_failure_uses_last_known() {
        assert_eq!(
            resolve_entry_price(Some(&FailingFeed), "ETHUSDT", Some(3000.0)),
            3000.0
        );
    }

    #[test]
    fn test_feed_failure_uses_static_table() {
        assert_eq!(resolve_entry_price(Some(&FailingFeed), "SOLUSDT", None), 150.0);
        assert_eq!(resolve_entry_price(None, "btcusdt", Some(0.0)), 65_000.0);
    }

    #[test]
    fn test_unknown_symbol_uses_default() {
        assert_eq!(
            resolve_entry_price(None, "UNKNOWNUSDT", None),
            DEFAULT_FALLBACK_PRICE
        );
    }

    #[test]
    fn test_invalid_quote_is_ignored() {
        let feed = StaticPriceFeed::new().with_price("SOLUSDT", 0.0);
        assert_eq!(resolve_entry_price(Some(&feed), "SOLUSDT", Some(140.0)), 140.0);
    }
}
