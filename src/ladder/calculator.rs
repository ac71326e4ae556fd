use super::common::{calculate_max_entry_count, martingale_weights};
use super::types::{Direction, EntryStep};
use crate::config::settings::BotSettings;

/// Price of ladder step `index` (0-based).
///
/// Offsets are linear from the first price: step `i` sits `deviation * i`
/// percent away from `first_price`, never compounded from the previous step.
pub fn step_price(first_price: f64, price_deviation: f64, index: u32, direction: Direction) -> f64 {
    if index == 0 {
        return first_price;
    }
    let delta = price_deviation * index as f64;
    first_price * (1.0 + direction.offset_sign() * delta / 100.0)
}

/// Derives the full ladder from `settings`.
///
/// Amounts follow the martingale weights and add up to `max_total_size`.
/// Returns exactly `entry_count` steps; no rounding is applied.
pub fn compute_ladder(settings: &BotSettings) -> Vec<EntryStep> {
    let weights = martingale_weights(settings.entry_count);
    let total_ratio: f64 = weights.iter().sum();
    let unit_amount = if total_ratio > 0.0 {
        settings.max_total_size / total_ratio
    } else {
        0.0
    };

    weights
        .iter()
        .enumerate()
        .map(|(i, weight)| {
            let index = i as u32;
            let percentage = if index == 0 {
                0.0
            } else {
                settings.direction.offset_sign() * settings.price_deviation * index as f64
            };
            EntryStep {
                step: index + 1,
                price: step_price(
                    settings.first_entry_price,
                    settings.price_deviation,
                    index,
                    settings.direction,
                ),
                percentage,
                amount: unit_amount * weight,
                entry_type: settings.entry_type,
                is_cycle_point: settings.cycle_enabled && index + 1 == settings.cycle_step,
            }
        })
        .collect()
}

/// Resizes a hand-edited ladder to `settings.entry_count` without touching
/// the prices or amounts of the steps that remain.
///
/// Growing clones the last step with the next step number. An empty ladder is
/// padded with first-price steps splitting the budget evenly.
pub fn resize_ladder(entries: &[EntryStep], settings: &BotSettings) -> Vec<EntryStep> {
    let target = settings.entry_count as usize;
    let mut resized: Vec<EntryStep> = entries.iter().take(target).cloned().collect();

    while resized.len() < target {
        let step = resized.len() as u32 + 1;
        let next = match resized.last() {
            Some(last) => EntryStep {
                step,
                ..last.clone()
            },
            None => EntryStep {
                step,
                price: settings.first_entry_price,
                percentage: 0.0,
                amount: settings.max_total_size / settings.entry_count as f64,
                entry_type: settings.entry_type,
                is_cycle_point: false,
            },
        };
        resized.push(next);
    }

    mark_cycle_points(&mut resized, settings);
    resized
}

/// Re-flags the cycle point after `cycle_step` or `cycle_enabled` moved.
pub fn mark_cycle_points(entries: &mut [EntryStep], settings: &BotSettings) {
    for entry in entries.iter_mut() {
        entry.is_cycle_point = settings.cycle_enabled && entry.step == settings.cycle_step;
    }
}

/// Percent offset of `price` from `first_price`, as stored in
/// [`EntryStep::percentage`].
pub fn percentage_from_first(first_price: f64, price: f64) -> f64 {
    if first_price > 0.0 {
        (price / first_price - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Settings of the reverse ladder, or `None` when it does not apply.
///
/// The reverse position opens in the opposite direction at the primary
/// ladder's price for `creation_step`, and is sized by its own budget.
pub fn reverse_settings(settings: &BotSettings, primary: &[EntryStep]) -> Option<BotSettings> {
    let reverse = &settings.reverse;
    if !reverse.enabled || reverse.max_total_size <= 0.0 {
        return None;
    }
    let anchor = primary
        .iter()
        .find(|e| e.step == reverse.creation_step)
        .map(|e| e.price)?;
    if anchor <= 0.0 {
        return None;
    }

    let max_entries = calculate_max_entry_count(reverse.max_total_size, anchor);
    let mut mirrored = settings.clone();
    mirrored.direction = settings.direction.opposite();
    mirrored.first_entry_price = anchor;
    mirrored.max_total_size = reverse.max_total_size;
    mirrored.entry_count = reverse.entry_count.clamp(1, max_entries);
    mirrored.price_deviation = reverse.price_deviation;
    mirrored.cycle_enabled = false;
    mirrored.reverse.enabled = false;
    Some(mirrored)
}

/// Ladder of the reverse position; empty when the reverse is disabled.
pub fn compute_reverse_ladder(settings: &BotSettings, primary: &[EntryStep]) -> Vec<EntryStep> {
    reverse_settings(settings, primary)
        .map(|mirrored| compute_ladder(&mirrored))
        .unwrap_or_default()
}
