use crate::config::save_config;
use crate::config::settings::{BotSettings, Direction, EntryType};
use crate::constants::{MAX_LEVERAGE, MIN_LEVERAGE};
use crate::engine::{LadderForm, SettingsEdit};
use crate::format::{format_amount, parse_numeric};
use crate::price::{resolve_entry_price, PriceFeed};
use crate::session::MemorySessionStore;
use crate::ui::console::ConsoleRenderer;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::fs;

/// Walks through the settings form interactively and saves a TOML file.
///
/// Every answer goes through the same coordinator as the CLI, so the prompts
/// always show the current ceilings and floors.
pub fn create_config(feed: Option<&dyn PriceFeed>) -> Result<()> {
    let theme = ColorfulTheme::default();

    let symbol: String = Input::with_theme(&theme)
        .with_prompt("Symbol (e.g., BTCUSDT)")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Symbol must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let symbol = symbol.trim().to_uppercase();

    let suggested_price = resolve_entry_price(feed, &symbol, None);
    let mut form = LadderForm::new(
        BotSettings::with_defaults(&symbol, Direction::Long, suggested_price),
        MemorySessionStore::new(),
    );

    let directions = vec!["Long", "Short"];
    let direction_sel = Select::with_theme(&theme)
        .with_prompt("Direction")
        .default(0)
        .items(&directions)
        .interact()?;
    form.apply(SettingsEdit::Direction(if direction_sel == 0 {
        Direction::Long
    } else {
        Direction::Short
    }));

    let leverage: u32 = Input::with_theme(&theme)
        .with_prompt(format!("Leverage ({}-{})", MIN_LEVERAGE, MAX_LEVERAGE))
        .default(form.settings().leverage)
        .validate_with(|input: &u32| -> Result<(), String> {
            if (MIN_LEVERAGE..=MAX_LEVERAGE).contains(input) {
                Ok(())
            } else {
                Err(format!(
                    "Leverage must be between {} and {}",
                    MIN_LEVERAGE, MAX_LEVERAGE
                ))
            }
        })
        .interact_text()?;
    form.apply(SettingsEdit::Leverage(leverage));

    let total = prompt_amount(
        &theme,
        "Max Total Size (quote, excl. leverage)",
        form.settings().max_total_size,
    )?;
    form.apply(SettingsEdit::MaxTotalSize(total));

    let price = prompt_amount(&theme, "First Entry Price", form.settings().first_entry_price)?;
    form.apply(SettingsEdit::FirstEntryPrice(price));

    let max_entries = form.max_entry_count();
    let entry_count: u32 = Input::with_theme(&theme)
        .with_prompt(format!("Entry Count (1-{})", max_entries))
        .default(form.settings().entry_count.min(max_entries))
        .validate_with(|input: &u32| -> Result<(), String> {
            if *input >= 1 && *input <= max_entries {
                Ok(())
            } else {
                Err(format!("Entry count must be between 1 and {}", max_entries))
            }
        })
        .interact_text()?;
    form.apply(SettingsEdit::EntryCount(entry_count));

    let deviation: f64 = Input::with_theme(&theme)
        .with_prompt("Price Deviation per Step (%)")
        .default(form.settings().price_deviation)
        .interact_text()?;
    form.apply(SettingsEdit::PriceDeviation(deviation));

    let entry_types = vec!["Market", "Limit", "AI Optimized"];
    let entry_type_sel = Select::with_theme(&theme)
        .with_prompt("Entry Type")
        .default(1)
        .items(&entry_types)
        .interact()?;
    let entry_type = match entry_type_sel {
        0 => EntryType::Market,
        2 => EntryType::AiOptimized,
        _ => EntryType::Limit,
    };
    form.apply(SettingsEdit::EntryType(entry_type));

    if entry_count > 1
        && Confirm::with_theme(&theme)
            .with_prompt("Enable risk-management cycle step?")
            .default(false)
            .interact()?
    {
        let ceiling = entry_count - 1;
        let cycle_step: u32 = Input::with_theme(&theme)
            .with_prompt(format!("Cycle Step (1-{})", ceiling))
            .default(form.settings().cycle_step.min(ceiling))
            .interact_text()?;
        form.apply(SettingsEdit::CycleEnabled(true));
        form.apply(SettingsEdit::CycleStep(cycle_step));
    }

    let take_profit: f64 = Input::with_theme(&theme)
        .with_prompt("Take Profit (%)")
        .default(form.settings().take_profit)
        .interact_text()?;
    form.apply(SettingsEdit::TakeProfit(take_profit));

    if Confirm::with_theme(&theme)
        .with_prompt("Enable stop loss?")
        .default(false)
        .interact()?
    {
        form.apply(SettingsEdit::StopLossEnabled(true));
        let bounds = form.stop_loss_bounds();
        let stop_loss: f64 = Input::with_theme(&theme)
            .with_prompt(format!("Stop Loss (%, min {:.2})", bounds.min_stop_loss))
            .default(form.settings().stop_loss)
            .interact_text()?;
        form.apply(SettingsEdit::StopLoss(stop_loss));
        if form.settings().stop_loss != stop_loss {
            println!(
                "Stop loss raised to the minimum of {:.2}%",
                form.settings().stop_loss
            );
        }
    }

    if entry_count > 1
        && Confirm::with_theme(&theme)
            .with_prompt("Enable auto-reverse position?")
            .default(false)
            .interact()?
    {
        let ceiling = entry_count - 1;
        let creation_step: u32 = Input::with_theme(&theme)
            .with_prompt(format!("Reverse opens at step (1-{})", ceiling))
            .default(ceiling)
            .interact_text()?;
        let reverse_total = prompt_amount(&theme, "Reverse Total Size", total / 2.0)?;
        let reverse_count: u32 = Input::with_theme(&theme)
            .with_prompt("Reverse Entry Count")
            .default(form.settings().reverse.entry_count)
            .interact_text()?;
        form.apply_all([
            SettingsEdit::ReverseEnabled(true),
            SettingsEdit::ReverseCreationStep(creation_step),
            SettingsEdit::ReverseMaxTotalSize(reverse_total),
            SettingsEdit::ReverseEntryCount(reverse_count),
        ]);
    }

    ConsoleRenderer::render(form.state());

    let default_filename = generate_default_filename(form.settings());
    let filename: String = Input::with_theme(&theme)
        .with_prompt("Configuration filename")
        .default(default_filename)
        .interact_text()?;

    let path = if filename.ends_with(".toml") {
        filename
    } else {
        format!("{}.toml", filename)
    };

    // Bare file names go to configs/ when that directory exists
    let final_path = if !path.contains('/') && fs::metadata("configs").is_ok() {
        format!("configs/{}", path)
    } else {
        path
    };

    save_config(&final_path, form.settings())?;
    println!("Configuration saved to {}", final_path);

    Ok(())
}

/// Text prompt for amounts that accepts thousands separators.
fn prompt_amount(theme: &ColorfulTheme, prompt: &str, default: f64) -> Result<f64> {
    let text: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(format_amount(default))
        .validate_with(|input: &String| -> Result<(), &str> {
            if parse_numeric(input) > 0.0 {
                Ok(())
            } else {
                Err("Enter a positive number")
            }
        })
        .interact_text()?;
    Ok(parse_numeric(&text))
}

fn generate_default_filename(settings: &BotSettings) -> String {
    format!(
        "{}_{:?}_{}x_{}steps_{}pct.toml",
        settings.symbol,
        settings.direction,
        settings.leverage,
        settings.entry_count,
        settings.price_deviation
    )
}
