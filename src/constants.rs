//! Central configuration constants for martingale-ladder.
//!
//! Tunable limits, defaults and fallback data used throughout the planner.
//! Modify values here to adjust behavior without changing the ladder math.

// =============================================================================
// LADDER LIMITS
// =============================================================================

/// Upper bound for the number of ladder steps.
pub const MAX_ENTRY_COUNT: u32 = 20;

/// Smallest per-unit allocation (quote currency) the solver accepts.
/// A step count is feasible only while `budget / W(n)` stays strictly above it.
pub const MIN_UNIT_AMOUNT: f64 = 1.0;

/// Leverage bounds accepted at submission time.
pub const MIN_LEVERAGE: u32 = 1;
pub const MAX_LEVERAGE: u32 = 125;

// =============================================================================
// FORM DEFAULTS
// =============================================================================

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_LEVERAGE: u32 = 10;
pub const DEFAULT_MAX_TOTAL_SIZE: f64 = 1_000.0;
pub const DEFAULT_ENTRY_COUNT: u32 = 5;
/// Percent offset per ladder step.
pub const DEFAULT_PRICE_DEVIATION: f64 = 1.0;
pub const DEFAULT_TAKE_PROFIT: f64 = 1.0;
pub const DEFAULT_CYCLE_STEP: u32 = 3;

// =============================================================================
// SESSION PERSISTENCE
// =============================================================================

pub const SETTINGS_KEY: &str = "martingale.settings";
pub const ENTRIES_KEY: &str = "martingale.entries";

/// Session blobs expire after one day.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

pub const DEFAULT_SESSION_FILE: &str = ".ladder_session.json";

// =============================================================================
// PRICE FALLBACKS
// =============================================================================

/// Static prices used when no live quote and no previous price is available.
pub const FALLBACK_PRICES: &[(&str, f64)] = &[
    ("BTCUSDT", 65_000.0),
    ("ETHUSDT", 3_200.0),
    ("SOLUSDT", 150.0),
    ("BNBUSDT", 580.0),
    ("XRPUSDT", 0.55),
    ("DOGEUSDT", 0.15),
    ("ADAUSDT", 0.45),
];

/// Last resort when the symbol is not in [`FALLBACK_PRICES`].
pub const DEFAULT_FALLBACK_PRICE: f64 = 1.0;
