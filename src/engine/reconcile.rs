//! Ordered re-derivation of dependent form fields.
//!
//! Every edit ends with one call to [`reconcile`]. Rules run once, in a fixed
//! order, and only move values toward their feasible range:
//!
//! 1. step count ceiling from budget, entry count clamped to it
//! 2. cycle step kept below the entry count
//! 3. stop-loss raised to its floor
//! 4. auto mode: ladder regenerated when one of its inputs moved
//! 5. manual mode: ladder resized to the entry count
//! 6. reverse creation step kept below the entry count, reverse ladder derived
//!
//! No later rule can push an earlier field back out of range, so a second pass
//! is a no-op.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::settings::BotSettings;
use crate::ladder::calculator::{
    compute_ladder, mark_cycle_points, resize_ladder, reverse_settings,
};
use crate::ladder::common::{calculate_max_entry_count, compute_stop_loss_bounds};
use crate::ladder::types::EntryStep;

/// Settings plus everything derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub settings: BotSettings,
    pub entries: Vec<EntryStep>,
    pub reverse_entries: Vec<EntryStep>,
    pub max_entry_count: u32,
}

impl FormState {
    /// Builds a consistent state from raw settings, deriving the ladder.
    pub fn derive(settings: BotSettings) -> Self {
        Self::with_entries(settings, Vec::new())
    }

    /// Builds a consistent state around an existing (possibly hand-edited)
    /// ladder. The ladder is only replaced if it no longer fits the settings.
    pub fn with_entries(settings: BotSettings, entries: Vec<EntryStep>) -> Self {
        let previous = settings.clone();
        reconcile(
            Some(&previous),
            FormState {
                settings,
                entries,
                reverse_entries: Vec::new(),
                max_entry_count: 1,
            },
        )
    }
}

/// Whether any input of the derived ladder differs between two settings.
fn ladder_inputs_changed(previous: Option<&BotSettings>, current: &BotSettings) -> bool {
    let Some(prev) = previous else {
        return true;
    };
    prev.first_entry_price != current.first_entry_price
        || prev.max_total_size != current.max_total_size
        || prev.entry_count != current.entry_count
        || prev.price_deviation != current.price_deviation
        || prev.direction != current.direction
        || prev.cycle_step != current.cycle_step
        || prev.cycle_enabled != current.cycle_enabled
        || prev.auto_entry_amount != current.auto_entry_amount
        || prev.entry_type != current.entry_type
}

/// Applies the coordination rules to `state`.
///
/// * `previous` - Settings before the edit, `None` to force a full derive.
/// * `state` - Settings after the edit together with the current ladder.
pub fn reconcile(previous: Option<&BotSettings>, mut state: FormState) -> FormState {
    let settings = &mut state.settings;

    // 1. Budget/price -> entry count ceiling
    state.max_entry_count =
        calculate_max_entry_count(settings.max_total_size, settings.first_entry_price);
    let clamped = settings.entry_count.clamp(1, state.max_entry_count);
    if clamped != settings.entry_count {
        debug!(
            "[RECONCILE] entry_count {} -> {} (ceiling {})",
            settings.entry_count, clamped, state.max_entry_count
        );
        settings.entry_count = clamped;
    }

    // 2. Entry count/cycle -> cycle step
    if settings.cycle_step == 0 {
        settings.cycle_step = 1;
    }
    if settings.cycle_enabled && settings.cycle_step >= settings.entry_count {
        let clamped = settings.entry_count.saturating_sub(1).max(1);
        debug!(
            "[RECONCILE] cycle_step {} -> {}",
            settings.cycle_step, clamped
        );
        settings.cycle_step = clamped;
    }

    // 3. Entry count/deviation -> stop-loss floor
    let bounds = compute_stop_loss_bounds(settings.entry_count, settings.price_deviation);
    if settings.stop_loss_enabled && settings.stop_loss < bounds.min_stop_loss {
        debug!(
            "[RECONCILE] stop_loss {} -> {}",
            settings.stop_loss, bounds.min_stop_loss
        );
        settings.stop_loss = bounds.min_stop_loss;
    }

    let target_len = settings.entry_count as usize;
    let can_derive = settings.max_total_size > 0.0 && settings.first_entry_price > 0.0;
    if settings.auto_entry_amount
        && can_derive
        && (ladder_inputs_changed(previous, settings) || state.entries.len() != target_len)
    {
        // 4. Auto mode regeneration
        state.entries = compute_ladder(settings);
        debug!(
            "[RECONCILE] regenerated ladder with {} steps",
            state.entries.len()
        );
    } else if !settings.auto_entry_amount && state.entries.is_empty() && can_derive {
        // Manual ladders start from the derived one
        state.entries = compute_ladder(settings);
    } else if state.entries.len() != target_len {
        // 5. Manual mode resize. An underivable auto ladder keeps its last
        // values but still tracks the step count.
        state.entries = resize_ladder(&state.entries, settings);
        debug!("[RECONCILE] resized ladder to {} steps", target_len);
    } else {
        mark_cycle_points(&mut state.entries, settings);
    }

    // 6. Reverse position ceiling
    let ceiling = settings.entry_count.saturating_sub(1).max(1);
    settings.reverse.creation_step = settings.reverse.creation_step.clamp(1, ceiling);
    settings.reverse.entry_count = settings.reverse.entry_count.max(1);
    match reverse_settings(settings, &state.entries) {
        Some(mirrored) => {
            settings.reverse.entry_count = mirrored.entry_count;
            state.reverse_entries = compute_ladder(&mirrored);
        }
        None => state.reverse_entries.clear(),
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::types::{Direction, EntryType};

    fn base_settings() -> BotSettings {
        let mut s = BotSettings::with_defaults("BTCUSDT", Direction::Long, 100.0);
        s.max_total_size = 1000.0;
        s.entry_count = 5;
        s.price_deviation = 1.0;
        s
    }

    fn edit<F: FnOnce(&mut BotSettings)>(state: &FormState, f: F) -> FormState {
        let previous = state.settings.clone();
        let mut next = state.clone();
        f(&mut next.settings);
        reconcile(Some(&previous), next)
    }

    #[test]
    fn test_derive_builds_ladder() {
        let state = FormState::derive(base_settings());
        assert_eq!(state.max_entry_count, 10);
        assert_eq!(state.entries.len(), 5);
        assert_eq!(state.entries, compute_ladder(&state.settings));
    }

    #[test]
    fn test_budget_cut_clamps_entry_count() {
        let mut s = base_settings();
        s.entry_count = 10;
        let state = FormState::derive(s);

        // 100 / W(7) = 1.56, 100 / W(8) = 0.78
        let state = edit(&state, |s| s.max_total_size = 100.0);
        assert_eq!(state.max_entry_count, 7);
        assert_eq!(state.settings.entry_count, 7);
        assert_eq!(state.entries.len(), 7);
    }

    #[test]
    fn test_cycle_step_clamp() {
        let mut s = base_settings();
        s.entry_count = 3;
        s.cycle_enabled = true;
        s.cycle_step = 5;
        let state = FormState::derive(s);
        assert_eq!(state.settings.cycle_step, 2);
        assert!(state.entries[1].is_cycle_point);
    }

    #[test]
    fn test_cycle_step_collapses_for_single_entry() {
        let state = FormState::derive(base_settings());
        let state = edit(&state, |s| {
            s.cycle_enabled = true;
            s.entry_count = 1;
        });
        assert_eq!(state.settings.cycle_step, 1);
        assert_eq!(state.entries.len(), 1);
    }

    #[test]
    fn test_cycle_step_untouched_when_disabled() {
        let mut s = base_settings();
        s.cycle_enabled = false;
        s.cycle_step = 9;
        let state = FormState::derive(s);
        assert_eq!(state.settings.cycle_step, 9);
    }

    #[test]
    fn test_stop_loss_raised_to_floor() {
        let mut s = base_settings();
        s.stop_loss_enabled = true;
        s.stop_loss = 2.0;
        let state = FormState::derive(s);
        assert_eq!(state.settings.stop_loss, 5.0);

        let state = edit(&state, |s| s.price_deviation = 2.0);
        assert_eq!(state.settings.stop_loss, 10.0);

        // A lower floor never lowers the stop
        let state = edit(&state, |s| s.entry_count = 2);
        assert_eq!(state.settings.stop_loss, 10.0);
    }

    #[test]
    fn test_disabled_stop_loss_is_not_raised() {
        let mut s = base_settings();
        s.stop_loss_enabled = false;
        s.stop_loss = 0.0;
        let state = FormState::derive(s);
        assert_eq!(state.settings.stop_loss, 0.0);
    }

    #[test]
    fn test_auto_mode_skips_without_budget() {
        let state = FormState::derive(base_settings());
        let before = state.entries.clone();
        let state = edit(&state, |s| s.max_total_size = 0.0);
        assert_eq!(state.settings.entry_count, 1);
        // Last derivable values are kept, trimmed to the step count
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0], before[0]);
    }

    #[test]
    fn test_manual_mode_seeded_from_derived_ladder() {
        let mut s = base_settings();
        s.auto_entry_amount = false;
        let state = FormState::derive(s);
        let mut auto = state.settings.clone();
        auto.auto_entry_amount = true;
        assert_eq!(state.entries, compute_ladder(&auto));
    }

    #[test]
    fn test_auto_mode_regenerates_on_entry_type() {
        let state = FormState::derive(base_settings());
        let state = edit(&state, |s| s.entry_type = EntryType::Market);
        assert!(state.entries.iter().all(|e| e.entry_type == EntryType::Market));
    }

    #[test]
    fn test_manual_mode_resize_preserves_edits() {
        let mut s = base_settings();
        s.auto_entry_amount = false;
        s.entry_count = 3;
        let mut state = FormState::derive(s);
        for (entry, amount) in state.entries.iter_mut().zip([10.0, 20.0, 30.0]) {
            entry.amount = amount;
        }

        let grown = edit(&state, |s| s.entry_count = 4);
        let amounts: Vec<f64> = grown.entries.iter().map(|e| e.amount).collect();
        let steps: Vec<u32> = grown.entries.iter().map(|e| e.step).collect();
        assert_eq!(amounts, vec![10.0, 20.0, 30.0, 30.0]);
        assert_eq!(steps, vec![1, 2, 3, 4]);

        let shrunk = edit(&state, |s| s.entry_count = 2);
        let amounts: Vec<f64> = shrunk.entries.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0]);
    }

    #[test]
    fn test_manual_mode_ignores_price_changes() {
        let mut s = base_settings();
        s.auto_entry_amount = false;
        let state = FormState::derive(s);
        let before = state.entries.clone();
        let state = edit(&state, |s| s.price_deviation = 3.0);
        assert_eq!(state.entries, before);
    }

    #[test]
    fn test_switch_to_auto_regenerates() {
        let mut s = base_settings();
        s.auto_entry_amount = false;
        let mut state = FormState::derive(s);
        state.entries[0].amount = 999.0;

        let state = edit(&state, |s| s.auto_entry_amount = true);
        assert_eq!(state.entries, compute_ladder(&state.settings));
    }

    #[test]
    fn test_reverse_creation_step_clamp() {
        let mut s = base_settings();
        s.reverse.enabled = true;
        s.reverse.creation_step = 4;
        s.reverse.max_total_size = 200.0;
        let state = FormState::derive(s);
        assert_eq!(state.settings.reverse.creation_step, 4);
        assert_eq!(state.reverse_entries.len(), 3);

        let state = edit(&state, |s| s.entry_count = 3);
        assert_eq!(state.settings.reverse.creation_step, 2);
        let anchor = state.entries[1].price;
        assert_eq!(state.reverse_entries[0].price, anchor);
    }

    #[test]
    fn test_reverse_entry_count_clamped_by_budget() {
        let mut s = base_settings();
        s.reverse.enabled = true;
        s.reverse.entry_count = 15;
        s.reverse.max_total_size = 10.0;
        let state = FormState::derive(s);
        // 10 / W(4) = 1.25, 10 / W(5) = 0.625
        assert_eq!(state.settings.reverse.entry_count, 4);
        assert_eq!(state.reverse_entries.len(), 4);
    }

    #[test]
    fn test_reconcile_is_a_fixed_point() {
        let mut s = base_settings();
        s.entry_count = 20;
        s.cycle_enabled = true;
        s.cycle_step = 30;
        s.stop_loss_enabled = true;
        s.reverse.enabled = true;
        s.reverse.creation_step = 50;
        s.reverse.max_total_size = 300.0;
        let once = FormState::derive(s);
        let twice = reconcile(Some(&once.settings), once.clone());
        assert_eq!(once, twice);
    }
}
