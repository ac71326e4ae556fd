use crate::error::BotError;
use crate::format::parse_numeric;
use crate::ladder::types::{Direction, EntryType};

/// A single user interaction on the settings form.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsEdit {
    Symbol(String),
    Direction(Direction),
    Leverage(u32),
    MaxTotalSize(f64),
    FirstEntryPrice(f64),
    EntryCount(u32),
    PriceDeviation(f64),
    EntryType(EntryType),
    CycleEnabled(bool),
    CycleStep(u32),
    StopLossEnabled(bool),
    StopLoss(f64),
    TakeProfit(f64),
    AutoEntryAmount(bool),
    ReverseEnabled(bool),
    ReverseCreationStep(u32),
    ReverseEntryCount(u32),
    ReversePriceDeviation(f64),
    ReverseMaxTotalSize(f64),
}

/// Hand edit of one ladder step in manual mode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntryEdit {
    pub price: Option<f64>,
    pub amount: Option<f64>,
}

/// Editable field keys with a short description, in form order.
pub const FIELDS: &[(&str, &str)] = &[
    ("symbol", "Instrument symbol (e.g. BTCUSDT)"),
    ("direction", "'long' or 'short'"),
    ("leverage", "Leverage multiplier (1-125)"),
    ("max_total_size", "Total notional across all steps, leverage-exclusive"),
    ("first_entry_price", "Price of step 1"),
    ("entry_count", "Number of ladder steps, capped by the budget"),
    ("price_deviation", "Percent offset per step beyond the first"),
    ("entry_type", "'market', 'limit' or 'ai_optimized'"),
    ("cycle_enabled", "Enable the risk-management cycle step"),
    ("cycle_step", "Step at which risk management activates"),
    ("stop_loss_enabled", "Enable the stop loss"),
    ("stop_loss", "Stop loss percent, at least entry_count * price_deviation"),
    ("take_profit", "Take profit percent"),
    ("auto_entry_amount", "Derive the ladder automatically (false = manual edits)"),
    ("reverse_enabled", "Enable the auto-reverse position"),
    ("reverse_creation_step", "Primary step that opens the reverse position"),
    ("reverse_entry_count", "Steps of the reverse ladder"),
    ("reverse_price_deviation", "Percent offset per reverse step"),
    ("reverse_max_total_size", "Total notional of the reverse ladder"),
];

fn parse_bool(key: &str, text: &str) -> Result<bool, BotError> {
    match text.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(BotError::ValidationError(format!(
            "{} expects true/false, got '{}'",
            key, other
        ))),
    }
}

fn parse_count(text: &str) -> u32 {
    // `as` saturates, so negatives become 0 and huge values u32::MAX
    parse_numeric(text).round() as u32
}

fn parse_direction(text: &str) -> Result<Direction, BotError> {
    match text.trim().to_lowercase().as_str() {
        "long" => Ok(Direction::Long),
        "short" => Ok(Direction::Short),
        other => Err(BotError::ValidationError(format!(
            "direction must be 'long' or 'short', got '{}'",
            other
        ))),
    }
}

fn parse_entry_type(text: &str) -> Result<EntryType, BotError> {
    match text.trim().to_lowercase().replace('-', "_").as_str() {
        "market" => Ok(EntryType::Market),
        "limit" => Ok(EntryType::Limit),
        "ai_optimized" | "ai" => Ok(EntryType::AiOptimized),
        other => Err(BotError::ValidationError(format!(
            "entry_type must be 'market', 'limit' or 'ai_optimized', got '{}'",
            other
        ))),
    }
}

impl SettingsEdit {
    /// Builds an edit from a text field. Numbers go through [`parse_numeric`],
    /// so malformed numeric text becomes 0 rather than an error.
    pub fn parse(key: &str, text: &str) -> Result<Self, BotError> {
        let edit = match key {
            "symbol" => SettingsEdit::Symbol(text.trim().to_uppercase()),
            "direction" => SettingsEdit::Direction(parse_direction(text)?),
            "leverage" => SettingsEdit::Leverage(parse_count(text)),
            "max_total_size" => SettingsEdit::MaxTotalSize(parse_numeric(text)),
            "first_entry_price" => SettingsEdit::FirstEntryPrice(parse_numeric(text)),
            "entry_count" => SettingsEdit::EntryCount(parse_count(text)),
            "price_deviation" => SettingsEdit::PriceDeviation(parse_numeric(text)),
            "entry_type" => SettingsEdit::EntryType(parse_entry_type(text)?),
            "cycle_enabled" => SettingsEdit::CycleEnabled(parse_bool(key, text)?),
            "cycle_step" => SettingsEdit::CycleStep(parse_count(text)),
            "stop_loss_enabled" => SettingsEdit::StopLossEnabled(parse_bool(key, text)?),
            "stop_loss" => SettingsEdit::StopLoss(parse_numeric(text)),
            "take_profit" => SettingsEdit::TakeProfit(parse_numeric(text)),
            "auto_entry_amount" => SettingsEdit::AutoEntryAmount(parse_bool(key, text)?),
            "reverse_enabled" => SettingsEdit::ReverseEnabled(parse_bool(key, text)?),
            "reverse_creation_step" => SettingsEdit::ReverseCreationStep(parse_count(text)),
            "reverse_entry_count" => SettingsEdit::ReverseEntryCount(parse_count(text)),
            "reverse_price_deviation" => SettingsEdit::ReversePriceDeviation(parse_numeric(text)),
            "reverse_max_total_size" => SettingsEdit::ReverseMaxTotalSize(parse_numeric(text)),
            _ => return Err(BotError::UnknownField(key.to_string())),
        };
        Ok(edit)
    }

    /// Parses a `key=value` assignment.
    pub fn parse_assignment(assignment: &str) -> Result<Self, BotError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            BotError::ValidationError(format!("Expected key=value, got '{}'", assignment))
        })?;
        Self::parse(key.trim(), value)
    }
}
