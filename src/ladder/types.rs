use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the position the ladder builds.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Buys on the way down: each step is priced below the first.
    #[default]
    Long,
    /// Sells on the way up: each step is priced above the first.
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// Sign applied to the per-step percentage offset.
    pub fn offset_sign(self) -> f64 {
        match self {
            Direction::Long => -1.0,
            Direction::Short => 1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Execution type carried by every step. Has no effect on ladder math.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Market,
    #[default]
    Limit,
    AiOptimized,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Market => write!(f, "market"),
            EntryType::Limit => write!(f, "limit"),
            EntryType::AiOptimized => write!(f, "ai_optimized"),
        }
    }
}

/// One rung of the ladder. `step` is 1-based.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EntryStep {
    pub step: u32,
    pub price: f64,
    /// Signed offset from the first entry price, in percent.
    pub percentage: f64,
    /// Leverage-exclusive notional in quote currency.
    pub amount: f64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub is_cycle_point: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLossBounds {
    pub min_stop_loss: f64,
    pub default_stop_loss: f64,
}
