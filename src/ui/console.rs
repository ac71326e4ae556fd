//! Console renderer for the ladder preview.

use crate::config::settings::BotSettings;
use crate::engine::FormState;
use crate::format::{format_amount, format_thousands};
use crate::ladder::common::compute_stop_loss_bounds;
use crate::ladder::types::EntryStep;

/// Console renderer for settings and derived ladders.
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    /// Render a complete ladder preview to stdout.
    pub fn render(state: &FormState) {
        println!();
        println!("{}", "=".repeat(72));
        println!(" MARTINGALE LADDER PREVIEW");
        println!("{}", "=".repeat(72));

        println!();
        Self::render_settings(&state.settings, state.max_entry_count);

        println!();
        println!("{}", "-".repeat(72));
        Self::render_ladder("ENTRY LADDER", &state.entries, state.settings.leverage);

        if !state.reverse_entries.is_empty() {
            println!();
            println!("{}", "-".repeat(72));
            let title = format!(
                "REVERSE LADDER ({} from step {})",
                state.settings.direction.opposite(),
                state.settings.reverse.creation_step
            );
            Self::render_ladder(&title, &state.reverse_entries, state.settings.leverage);
        }

        println!();
        println!("{}", "=".repeat(72));
        println!();
    }

    fn render_settings(s: &BotSettings, max_entry_count: u32) {
        println!("SETTINGS");
        println!("Symbol:      {}", s.symbol);
        println!("Direction:   {}", s.direction);
        println!("Leverage:    {}x", s.leverage);
        println!("Total Size:  {}", format_amount(s.max_total_size));
        println!("First Price: {}", format_thousands(s.first_entry_price));
        println!("Entries:     {} (max {})", s.entry_count, max_entry_count);
        println!("Deviation:   {}%", s.price_deviation);
        println!("Entry Type:  {}", s.entry_type);
        println!(
            "Mode:        {}",
            if s.auto_entry_amount { "auto" } else { "manual" }
        );

        if s.cycle_enabled {
            println!("Cycle Step:  {}", s.cycle_step);
        }

        println!("Take Profit: {}%", s.take_profit);
        let bounds = compute_stop_loss_bounds(s.entry_count, s.price_deviation);
        if s.stop_loss_enabled {
            println!(
                "Stop Loss:   {:.2}% (min {:.2}%)",
                s.stop_loss, bounds.min_stop_loss
            );
        } else {
            println!("Stop Loss:   off (min {:.2}%)", bounds.min_stop_loss);
        }
    }

    fn render_ladder(title: &str, entries: &[EntryStep], leverage: u32) {
        println!("{} ({} Steps)", title, entries.len());
        println!(
            "{:<5} | {:<16} | {:<9} | {:<14} | {:<16} | {:<12} | FLAG",
            "STEP", "PRICE", "OFFSET %", "AMOUNT", "NOTIONAL (LEV)", "TYPE"
        );
        println!("{}", "-".repeat(100));

        for e in entries {
            let flag = if e.is_cycle_point { "CYCLE" } else { "" };
            println!(
                "{:<5} | {:<16} | {:<9.2} | {:<14} | {:<16} | {:<12} | {}",
                e.step,
                format_amount(e.price),
                e.percentage,
                format_amount(e.amount),
                format_amount(e.amount * leverage as f64),
                e.entry_type.to_string(),
                flag
            );
        }

        let total: f64 = entries.iter().map(|e| e.amount).sum();
        println!("{}", "-".repeat(100));
        println!(
            "Total: {} ({} with leverage)",
            format_amount(total),
            format_amount(total * leverage as f64)
        );
    }
}
