//! Request bodies for the bot-creation and backtest APIs.
//!
//! The ladder stores leverage-exclusive notional. The bot-creation body is the
//! one place where amounts are multiplied by leverage.

pub mod types;

use chrono::Utc;
use uuid::Uuid;

use crate::config::exchange::ExchangeConfig;
use crate::config::settings::BotSettings;
use crate::engine::FormState;
use crate::ladder::types::EntryStep;

pub use types::{
    BacktestPeriod, BacktestRequest, BasicGroup, CreateBotRequest, EntryGroup, EntryOrder,
    ExitGroup, Metadata, ReverseGroup,
};

pub const REQUEST_SOURCE: &str = "martingale-ladder";

fn entry_orders(entries: &[EntryStep], multiplier: f64) -> Vec<EntryOrder> {
    entries
        .iter()
        .map(|e| EntryOrder {
            step: e.step,
            price: e.price,
            amount: e.amount * multiplier,
            entry_type: e.entry_type,
        })
        .collect()
}

fn basic_group(settings: &BotSettings) -> BasicGroup {
    BasicGroup {
        symbol: settings.symbol.clone(),
        direction: settings.direction,
        leverage: settings.leverage,
        max_total_size: settings.max_total_size,
    }
}

fn entry_group(settings: &BotSettings) -> EntryGroup {
    EntryGroup {
        entry_type: settings.entry_type,
        entry_count: settings.entry_count,
        price_deviation: settings.price_deviation,
        auto_entry_amount: settings.auto_entry_amount,
        cycle_enabled: settings.cycle_enabled,
        cycle_step: settings.cycle_step,
    }
}

fn exit_group(settings: &BotSettings) -> ExitGroup {
    ExitGroup {
        take_profit: settings.take_profit,
        stop_loss_enabled: settings.stop_loss_enabled,
        stop_loss: settings.stop_loss_enabled.then_some(settings.stop_loss),
    }
}

fn reverse_group(state: &FormState, multiplier: f64) -> Option<ReverseGroup> {
    let reverse = &state.settings.reverse;
    if !reverse.enabled || state.reverse_entries.is_empty() {
        return None;
    }
    Some(ReverseGroup {
        creation_step: reverse.creation_step,
        direction: state.settings.direction.opposite(),
        entry_count: reverse.entry_count,
        price_deviation: reverse.price_deviation,
        max_total_size: reverse.max_total_size,
        entries: entry_orders(&state.reverse_entries, multiplier),
    })
}

/// Shapes the form into a bot-creation body with leveraged step amounts.
pub fn build_bot_request(state: &FormState, exchange: &ExchangeConfig) -> CreateBotRequest {
    let leverage = state.settings.leverage as f64;
    CreateBotRequest {
        basic: basic_group(&state.settings),
        entry: entry_group(&state.settings),
        exit: exit_group(&state.settings),
        reverse: reverse_group(state, leverage),
        metadata: Metadata {
            client_request_id: Uuid::new_v4(),
            created_at: Utc::now(),
            exchange: exchange.exchange.clone(),
            network: exchange.network.clone(),
            source: REQUEST_SOURCE.to_string(),
        },
        entries: entry_orders(&state.entries, leverage),
    }
}

/// Shapes the form into a backtest body; amounts stay leverage-exclusive.
pub fn build_backtest_request(state: &FormState, period: BacktestPeriod) -> BacktestRequest {
    BacktestRequest {
        testing_period: period.minutes(),
        basic: basic_group(&state.settings),
        entry: entry_group(&state.settings),
        exit: exit_group(&state.settings),
        reverse: reverse_group(state, 1.0),
        entries: entry_orders(&state.entries, 1.0),
    }
}
