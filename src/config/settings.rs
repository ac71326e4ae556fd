use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CYCLE_STEP, DEFAULT_ENTRY_COUNT, DEFAULT_LEVERAGE, DEFAULT_MAX_TOTAL_SIZE,
    DEFAULT_PRICE_DEVIATION, DEFAULT_SYMBOL, DEFAULT_TAKE_PROFIT, MAX_LEVERAGE, MIN_LEVERAGE,
};
use crate::ladder::common::{calculate_max_entry_count, compute_stop_loss_bounds};
pub use crate::ladder::types::{Direction, EntryType};

/// Root of the bot configuration the form edits.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BotSettings {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default)]
    pub direction: Direction,
    pub leverage: u32,
    /// Total notional across all steps, leverage-exclusive.
    pub max_total_size: f64,
    pub first_entry_price: f64,
    pub entry_count: u32,
    /// Percent offset added per step beyond the first.
    pub price_deviation: f64,
    #[serde(default)]
    pub entry_type: EntryType,
    #[serde(default)]
    pub cycle_enabled: bool,
    #[serde(default = "default_cycle_step")]
    pub cycle_step: u32,
    #[serde(default)]
    pub stop_loss_enabled: bool,
    #[serde(default)]
    pub stop_loss: f64,
    #[serde(default = "default_take_profit")]
    pub take_profit: f64,
    /// true: ladder fully derived. false: per-step values are hand-edited.
    #[serde(default = "default_true")]
    pub auto_entry_amount: bool,
    #[serde(default)]
    pub reverse: ReverseSettings,
}

/// Opposite-direction ladder created once the primary ladder reaches
/// `creation_step`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReverseSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_creation_step")]
    pub creation_step: u32,
    #[serde(default = "default_reverse_entry_count")]
    pub entry_count: u32,
    #[serde(default = "default_price_deviation")]
    pub price_deviation: f64,
    #[serde(default)]
    pub max_total_size: f64,
}

fn default_symbol() -> String {
    DEFAULT_SYMBOL.to_string()
}

fn default_cycle_step() -> u32 {
    DEFAULT_CYCLE_STEP
}

fn default_take_profit() -> f64 {
    DEFAULT_TAKE_PROFIT
}

fn default_true() -> bool {
    true
}

fn default_creation_step() -> u32 {
    1
}

fn default_reverse_entry_count() -> u32 {
    3
}

fn default_price_deviation() -> f64 {
    DEFAULT_PRICE_DEVIATION
}

impl Default for ReverseSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            creation_step: default_creation_step(),
            entry_count: default_reverse_entry_count(),
            price_deviation: default_price_deviation(),
            max_total_size: 0.0,
        }
    }
}

impl BotSettings {
    /// Fresh settings for `symbol`, seeded with a first entry price.
    pub fn with_defaults(symbol: &str, direction: Direction, first_entry_price: f64) -> Self {
        let stop_loss = compute_stop_loss_bounds(DEFAULT_ENTRY_COUNT, DEFAULT_PRICE_DEVIATION)
            .default_stop_loss;
        Self {
            symbol: symbol.to_string(),
            direction,
            leverage: DEFAULT_LEVERAGE,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
            first_entry_price,
            entry_count: DEFAULT_ENTRY_COUNT,
            price_deviation: DEFAULT_PRICE_DEVIATION,
            entry_type: EntryType::default(),
            cycle_enabled: false,
            cycle_step: DEFAULT_CYCLE_STEP,
            stop_loss_enabled: false,
            stop_loss,
            take_profit: DEFAULT_TAKE_PROFIT,
            auto_entry_amount: true,
            reverse: ReverseSettings::default(),
        }
    }

    /// Submission-time checks for settings loaded from a file.
    ///
    /// The form itself never rejects input; it clamps. Files bypass the form,
    /// so they are held to the same invariants here.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(anyhow::anyhow!("Symbol must not be empty."));
        }
        if self.leverage < MIN_LEVERAGE || self.leverage > MAX_LEVERAGE {
            return Err(anyhow::anyhow!(
                "Leverage must be between {} and {}",
                MIN_LEVERAGE,
                MAX_LEVERAGE
            ));
        }
        if self.first_entry_price.is_nan() || self.first_entry_price <= 0.0 {
            return Err(anyhow::anyhow!("First entry price must be positive."));
        }
        if self.max_total_size.is_nan() || self.max_total_size < 0.0 {
            return Err(anyhow::anyhow!("Max total size must not be negative."));
        }
        if self.price_deviation.is_nan() || self.price_deviation < 0.0 {
            return Err(anyhow::anyhow!("Price deviation must not be negative."));
        }

        let max_entries = calculate_max_entry_count(self.max_total_size, self.first_entry_price);
        if self.entry_count == 0 || self.entry_count > max_entries {
            return Err(anyhow::anyhow!(
                "Entry count {} must be between 1 and {} for a total size of {}.",
                self.entry_count,
                max_entries,
                self.max_total_size
            ));
        }

        if self.cycle_enabled {
            let valid = if self.entry_count == 1 {
                self.cycle_step == 1
            } else {
                self.cycle_step >= 1 && self.cycle_step < self.entry_count
            };
            if !valid {
                return Err(anyhow::anyhow!(
                    "Cycle step {} must be between 1 and {}.",
                    self.cycle_step,
                    self.entry_count.saturating_sub(1).max(1)
                ));
            }
        }

        if self.stop_loss_enabled {
            let bounds = compute_stop_loss_bounds(self.entry_count, self.price_deviation);
            if self.stop_loss < bounds.min_stop_loss {
                return Err(anyhow::anyhow!(
                    "Stop loss {}% is below the minimum of {}%.",
                    self.stop_loss,
                    bounds.min_stop_loss
                ));
            }
        }

        if self.take_profit.is_nan() || self.take_profit < 0.0 {
            return Err(anyhow::anyhow!("Take profit must not be negative."));
        }

        if self.reverse.enabled {
            let ceiling = self.entry_count.saturating_sub(1).max(1);
            if self.reverse.creation_step == 0 || self.reverse.creation_step > ceiling {
                return Err(anyhow::anyhow!(
                    "Reverse creation step {} must be between 1 and {}.",
                    self.reverse.creation_step,
                    ceiling
                ));
            }
            if self.reverse.entry_count == 0 {
                return Err(anyhow::anyhow!("Reverse entry count must be at least 1."));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> BotSettings {
        BotSettings::with_defaults("BTCUSDT", Direction::Long, 100.0)
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = valid_settings();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.stop_loss, 6.0);
        assert!(settings.auto_entry_amount);
    }

    #[test]
    fn test_validation_invalid_leverage() {
        let mut settings = valid_settings();
        settings.leverage = 0;
        assert!(settings.validate().is_err());

        settings.leverage = MAX_LEVERAGE + 1;
        assert_eq!(
            settings.validate().unwrap_err().to_string(),
            "Leverage must be between 1 and 125"
        );
    }

    #[test]
    fn test_validation_entry_count_above_ceiling() {
        let mut settings = valid_settings();
        settings.max_total_size = 1000.0;
        settings.entry_count = 11;
        let res = settings.validate();
        assert!(res.is_err());
        assert!(res.unwrap_err().to_string().contains("between 1 and 10"));
    }

    #[test]
    fn test_validation_cycle_step() {
        let mut settings = valid_settings();
        settings.cycle_enabled = true;
        settings.cycle_step = 5;
        assert!(settings.validate().is_err());

        settings.cycle_step = 4;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_stop_loss_floor() {
        let mut settings = valid_settings();
        settings.stop_loss_enabled = true;
        settings.stop_loss = 4.0;
        assert_eq!(
            settings.validate().unwrap_err().to_string(),
            "Stop loss 4% is below the minimum of 5%."
        );

        settings.stop_loss = 5.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_reverse_creation_step() {
        let mut settings = valid_settings();
        settings.reverse.enabled = true;
        settings.reverse.creation_step = 5;
        assert!(settings.validate().is_err());

        settings.reverse.creation_step = 4;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
            leverage = 5
            max_total_size = 500.0
            first_entry_price = 2000.0
            entry_count = 4
            price_deviation = 1.5
            direction = "short"
            entry_type = "ai_optimized"
        "#;
        let settings: BotSettings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.symbol, DEFAULT_SYMBOL);
        assert_eq!(settings.direction, Direction::Short);
        assert_eq!(settings.entry_type, EntryType::AiOptimized);
        assert!(settings.auto_entry_amount);
        assert!(!settings.reverse.enabled);
        assert!(settings.validate().is_ok());
    }
}
