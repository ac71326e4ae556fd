use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BotError;
use crate::ladder::types::{Direction, EntryType};

// ============================================================
// Request groups
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicGroup {
    pub symbol: String,
    pub direction: Direction,
    pub leverage: u32,
    pub max_total_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryGroup {
    pub entry_type: EntryType,
    pub entry_count: u32,
    pub price_deviation: f64,
    pub auto_entry_amount: bool,
    pub cycle_enabled: bool,
    pub cycle_step: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitGroup {
    pub take_profit: f64,
    pub stop_loss_enabled: bool,
    /// Present only when the stop loss is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGroup {
    pub creation_step: u32,
    pub direction: Direction,
    pub entry_count: u32,
    pub price_deviation: f64,
    pub max_total_size: f64,
    pub entries: Vec<EntryOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub client_request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub exchange: String,
    pub network: String,
    pub source: String,
}

/// One ladder step as the APIs expect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryOrder {
    pub step: u32,
    pub price: f64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

// ============================================================
// Request bodies
// ============================================================

/// Body of the bot-creation call. Amounts include leverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub basic: BasicGroup,
    pub entry: EntryGroup,
    pub exit: ExitGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<ReverseGroup>,
    pub metadata: Metadata,
    pub entries: Vec<EntryOrder>,
}

/// Body of the backtest call. Amounts are leverage-exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    /// Minutes of history to replay.
    pub testing_period: u32,
    pub basic: BasicGroup,
    pub entry: EntryGroup,
    pub exit: ExitGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<ReverseGroup>,
    pub entries: Vec<EntryOrder>,
}

// ============================================================
// Backtest period
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BacktestPeriod {
    #[serde(rename = "1m")]
    OneMonth,
    #[default]
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl BacktestPeriod {
    pub fn minutes(self) -> u32 {
        match self {
            BacktestPeriod::OneMonth => 43_200,
            BacktestPeriod::ThreeMonths => 129_600,
            BacktestPeriod::SixMonths => 259_200,
            BacktestPeriod::OneYear => 525_600,
        }
    }
}

impl fmt::Display for BacktestPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BacktestPeriod::OneMonth => "1m",
            BacktestPeriod::ThreeMonths => "3m",
            BacktestPeriod::SixMonths => "6m",
            BacktestPeriod::OneYear => "1y",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for BacktestPeriod {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1month" => Ok(BacktestPeriod::OneMonth),
            "3m" | "3months" => Ok(BacktestPeriod::ThreeMonths),
            "6m" | "6months" => Ok(BacktestPeriod::SixMonths),
            "1y" | "1year" => Ok(BacktestPeriod::OneYear),
            other => Err(BotError::ValidationError(format!(
                "Unknown backtest period '{}' (expected 1m, 3m, 6m or 1y)",
                other
            ))),
        }
    }
}
