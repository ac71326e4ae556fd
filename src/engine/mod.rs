//! Form state machine around the ladder calculator.
//!
//! [`LadderForm`] owns the settings, applies one edit at a time, reconciles
//! the dependent fields and persists the result to its session store.

pub mod edit;
pub mod reconcile;

use chrono::Utc;
use log::{debug, info, warn};

use crate::config::settings::BotSettings;
use crate::constants::{MAX_ENTRY_COUNT, MAX_LEVERAGE, MIN_LEVERAGE};
use crate::ladder::calculator::percentage_from_first;
use crate::ladder::common::compute_stop_loss_bounds;
use crate::ladder::types::{Direction, EntryStep, StopLossBounds};
use crate::price::{resolve_entry_price, PriceFeed};
use crate::session::{load_session, save_session, SessionStore};

pub use edit::{EntryEdit, SettingsEdit, FIELDS};
pub use reconcile::{reconcile, FormState};

/// Negative, NaN and infinite input collapses to 0.
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub struct LadderForm<S: SessionStore> {
    state: FormState,
    store: S,
}

impl<S: SessionStore> LadderForm<S> {
    /// Starts a form from explicit settings and persists it.
    pub fn new(settings: BotSettings, store: S) -> Self {
        let mut form = Self {
            state: FormState::derive(settings),
            store,
        };
        form.persist();
        form
    }

    /// Restores the session for `symbol`, or builds defaults seeded by the
    /// price feed when there is nothing usable to restore.
    pub fn restore(mut store: S, feed: Option<&dyn PriceFeed>, symbol: &str) -> Self {
        let symbol = symbol.to_uppercase();
        if let Some(snapshot) = load_session(&mut store, Utc::now()) {
            if snapshot.settings.symbol == symbol {
                info!("Restored session for {}", symbol);
                let mut form = Self {
                    state: FormState::with_entries(snapshot.settings, snapshot.entries),
                    store,
                };
                form.persist();
                return form;
            }
            info!(
                "Session holds {}, starting fresh for {}",
                snapshot.settings.symbol, symbol
            );
        }

        let price = resolve_entry_price(feed, &symbol, None);
        Self::new(
            BotSettings::with_defaults(&symbol, Direction::default(), price),
            store,
        )
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn settings(&self) -> &BotSettings {
        &self.state.settings
    }

    pub fn entries(&self) -> &[EntryStep] {
        &self.state.entries
    }

    pub fn reverse_entries(&self) -> &[EntryStep] {
        &self.state.reverse_entries
    }

    pub fn max_entry_count(&self) -> u32 {
        self.state.max_entry_count
    }

    pub fn stop_loss_bounds(&self) -> StopLossBounds {
        compute_stop_loss_bounds(
            self.state.settings.entry_count,
            self.state.settings.price_deviation,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies one field edit, reconciles and persists.
    pub fn apply(&mut self, edit: SettingsEdit) {
        let previous = self.state.settings.clone();
        let mut next = self.state.clone();
        let s = &mut next.settings;

        match edit {
            SettingsEdit::Symbol(symbol) => s.symbol = symbol,
            SettingsEdit::Direction(direction) => s.direction = direction,
            SettingsEdit::Leverage(leverage) => {
                s.leverage = leverage.clamp(MIN_LEVERAGE, MAX_LEVERAGE)
            }
            SettingsEdit::MaxTotalSize(v) => s.max_total_size = non_negative(v),
            SettingsEdit::FirstEntryPrice(v) => s.first_entry_price = non_negative(v),
            SettingsEdit::EntryCount(n) => s.entry_count = n.max(1),
            SettingsEdit::PriceDeviation(v) => s.price_deviation = non_negative(v),
            SettingsEdit::EntryType(t) => s.entry_type = t,
            SettingsEdit::CycleEnabled(on) => s.cycle_enabled = on,
            SettingsEdit::CycleStep(n) => s.cycle_step = n.max(1),
            SettingsEdit::StopLossEnabled(on) => {
                s.stop_loss_enabled = on;
                if on && s.stop_loss <= 0.0 {
                    s.stop_loss =
                        compute_stop_loss_bounds(s.entry_count, s.price_deviation).default_stop_loss;
                }
            }
            SettingsEdit::StopLoss(v) => s.stop_loss = non_negative(v),
            SettingsEdit::TakeProfit(v) => s.take_profit = non_negative(v),
            SettingsEdit::AutoEntryAmount(on) => s.auto_entry_amount = on,
            SettingsEdit::ReverseEnabled(on) => s.reverse.enabled = on,
            SettingsEdit::ReverseCreationStep(n) => s.reverse.creation_step = n.max(1),
            SettingsEdit::ReverseEntryCount(n) => s.reverse.entry_count = n.max(1),
            SettingsEdit::ReversePriceDeviation(v) => s.reverse.price_deviation = non_negative(v),
            SettingsEdit::ReverseMaxTotalSize(v) => s.reverse.max_total_size = non_negative(v),
        }

        self.state = reconcile(Some(&previous), next);
        self.persist();
    }

    pub fn apply_all(&mut self, edits: impl IntoIterator<Item = SettingsEdit>) {
        for edit in edits {
            self.apply(edit);
        }
    }

    /// Overwrites price and/or amount of one step of a manual ladder.
    ///
    /// Percentages are recomputed against the first price, and the total size
    /// follows the sum of the edited amounts. Ignored in auto mode.
    pub fn edit_entry(&mut self, step: u32, edit: EntryEdit) {
        if self.state.settings.auto_entry_amount {
            warn!("Ignoring edit of step {}: ladder is in auto mode", step);
            return;
        }
        let Some(index) = self.state.entries.iter().position(|e| e.step == step) else {
            warn!("Ignoring edit of unknown step {}", step);
            return;
        };

        let previous = self.state.settings.clone();
        let mut next = self.state.clone();

        if let Some(amount) = edit.amount {
            next.entries[index].amount = non_negative(amount);
        }
        if let Some(price) = edit.price {
            next.entries[index].price = non_negative(price);
            if index == 0 {
                next.settings.first_entry_price = next.entries[0].price;
            }
        }

        let first_price = next.settings.first_entry_price;
        for entry in next.entries.iter_mut() {
            entry.percentage = if entry.step == 1 {
                0.0
            } else {
                percentage_from_first(first_price, entry.price)
            };
        }
        next.settings.max_total_size = next.entries.iter().map(|e| e.amount).sum();
        debug!(
            "Manual edit of step {}: total size now {}",
            step, next.settings.max_total_size
        );

        let mut state = reconcile(Some(&previous), next);
        // Truncation lowers the total, which can lower the ceiling again.
        for _ in 0..MAX_ENTRY_COUNT {
            let total: f64 = state.entries.iter().map(|e| e.amount).sum();
            if total == state.settings.max_total_size {
                break;
            }
            let before = state.settings.clone();
            state.settings.max_total_size = total;
            state = reconcile(Some(&before), state);
        }

        self.state = state;
        self.persist();
    }

    /// Re-seeds the first entry price from the feed, keeping the current
    /// price when the feed fails.
    pub fn refresh_price(&mut self, feed: Option<&dyn PriceFeed>) {
        let current = self.state.settings.first_entry_price;
        let price = resolve_entry_price(feed, &self.state.settings.symbol, Some(current));
        if price != current {
            self.apply(SettingsEdit::FirstEntryPrice(price));
        }
    }

    /// Switches instrument and re-seeds its price.
    pub fn select_symbol(&mut self, symbol: &str, feed: Option<&dyn PriceFeed>) {
        let symbol = symbol.to_uppercase();
        if symbol == self.state.settings.symbol {
            return;
        }
        self.apply(SettingsEdit::Symbol(symbol.clone()));
        let price = resolve_entry_price(feed, &symbol, None);
        self.apply(SettingsEdit::FirstEntryPrice(price));
    }

    /// Back to defaults after a successful bot creation. Symbol and direction
    /// survive; the price is re-seeded.
    pub fn reset_after_submit(&mut self, feed: Option<&dyn PriceFeed>) {
        let symbol = self.state.settings.symbol.clone();
        let direction = self.state.settings.direction;
        let last_known = Some(self.state.settings.first_entry_price);
        let price = resolve_entry_price(feed, &symbol, last_known);
        info!("Resetting form for {} ({})", symbol, direction);
        self.state = FormState::derive(BotSettings::with_defaults(&symbol, direction, price));
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = save_session(
            &mut self.store,
            &self.state.settings,
            &self.state.entries,
            Utc::now(),
        ) {
            warn!("Failed to persist session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SETTINGS_KEY;
    use crate::ladder::calculator::compute_ladder;
    use crate::ladder::types::EntryType;
    use crate::price::StaticPriceFeed;
    use crate::session::MemorySessionStore;

    fn form() -> LadderForm<MemorySessionStore> {
        let mut settings = BotSettings::with_defaults("BTCUSDT", Direction::Long, 100.0);
        settings.max_total_size = 1000.0;
        settings.entry_count = 5;
        settings.price_deviation = 1.0;
        LadderForm::new(settings, MemorySessionStore::new())
    }

    #[test]
    fn test_apply_regenerates_auto_ladder() {
        let mut form = form();
        form.apply(SettingsEdit::EntryCount(3));
        assert_eq!(form.entries().len(), 3);
        assert_eq!(form.entries(), compute_ladder(form.settings()).as_slice());

        form.apply(SettingsEdit::Direction(Direction::Short));
        assert!(form.entries()[2].price > form.entries()[0].price);
    }

    #[test]
    fn test_apply_coerces_bad_values() {
        let mut form = form();
        form.apply(SettingsEdit::Leverage(0));
        assert_eq!(form.settings().leverage, MIN_LEVERAGE);
        form.apply(SettingsEdit::Leverage(1000));
        assert_eq!(form.settings().leverage, MAX_LEVERAGE);

        form.apply(SettingsEdit::PriceDeviation(f64::NAN));
        assert_eq!(form.settings().price_deviation, 0.0);

        form.apply(SettingsEdit::EntryCount(0));
        assert_eq!(form.settings().entry_count, 1);

        form.apply(SettingsEdit::EntryCount(50));
        assert_eq!(form.settings().entry_count, form.max_entry_count());
    }

    #[test]
    fn test_enabling_stop_loss_seeds_default() {
        let mut form = form();
        form.apply(SettingsEdit::StopLoss(0.0));
        form.apply(SettingsEdit::StopLossEnabled(true));
        assert_eq!(form.settings().stop_loss, 6.0);
        assert_eq!(form.stop_loss_bounds().min_stop_loss, 5.0);

        form.apply(SettingsEdit::StopLoss(1.0));
        assert_eq!(form.settings().stop_loss, 5.0);
    }

    #[test]
    fn test_edit_entry_updates_total_and_percentages() {
        let mut form = form();
        form.apply(SettingsEdit::AutoEntryAmount(false));
        form.apply(SettingsEdit::EntryCount(3));

        form.edit_entry(
            2,
            EntryEdit {
                price: Some(97.0),
                amount: Some(400.0),
            },
        );
        let amounts: f64 = form.entries().iter().map(|e| e.amount).sum();
        assert!((form.settings().max_total_size - amounts).abs() < 1e-9);
        assert!((form.entries()[1].percentage - -3.0).abs() < 1e-9);
        assert_eq!(form.entries()[1].amount, 400.0);

        form.edit_entry(
            1,
            EntryEdit {
                price: Some(200.0),
                amount: None,
            },
        );
        assert_eq!(form.settings().first_entry_price, 200.0);
        assert_eq!(form.entries()[0].percentage, 0.0);
        assert!((form.entries()[1].percentage - -51.5).abs() < 1e-9);
    }

    #[test]
    fn test_edit_entry_total_tracks_truncated_ladder() {
        let mut form = form();
        form.apply(SettingsEdit::AutoEntryAmount(false));
        assert_eq!(form.entries().len(), 5);

        for step in 1..=5 {
            form.edit_entry(
                step,
                EntryEdit {
                    price: None,
                    amount: Some(1.0),
                },
            );
            let amounts: f64 = form.entries().iter().map(|e| e.amount).sum();
            assert!((form.settings().max_total_size - amounts).abs() < 1e-9);
            assert_eq!(form.entries().len() as u32, form.settings().entry_count);
            assert!(form.settings().entry_count <= form.max_entry_count());
        }
        assert!(form.settings().entry_count < 5);
    }

    #[test]
    fn test_edit_entry_ignored_in_auto_mode() {
        let mut form = form();
        let before = form.state().clone();
        form.edit_entry(
            1,
            EntryEdit {
                price: None,
                amount: Some(1.0),
            },
        );
        assert_eq!(form.state(), &before);
    }

    #[test]
    fn test_manual_resize_through_form() {
        let mut form = form();
        form.apply(SettingsEdit::AutoEntryAmount(false));
        form.apply(SettingsEdit::EntryCount(3));
        for (step, amount) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
            form.edit_entry(
                step,
                EntryEdit {
                    price: None,
                    amount: Some(amount),
                },
            );
        }

        form.apply(SettingsEdit::EntryCount(4));
        let amounts: Vec<f64> = form.entries().iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0, 30.0, 30.0]);

        form.apply(SettingsEdit::EntryCount(2));
        let amounts: Vec<f64> = form.entries().iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0]);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut form = form();
        form.apply(SettingsEdit::AutoEntryAmount(false));
        form.edit_entry(
            2,
            EntryEdit {
                price: None,
                amount: Some(77.0),
            },
        );
        let saved = form.state().clone();
        let store = form.store().clone();

        let restored = LadderForm::restore(store, None, "btcusdt");
        assert_eq!(restored.settings(), &saved.settings);
        assert_eq!(restored.entries(), saved.entries.as_slice());
    }

    #[test]
    fn test_restore_without_session_uses_feed() {
        let feed = StaticPriceFeed::new().with_price("ETHUSDT", 2500.0);
        let form = LadderForm::restore(MemorySessionStore::new(), Some(&feed), "ethusdt");
        assert_eq!(form.settings().symbol, "ETHUSDT");
        assert_eq!(form.settings().first_entry_price, 2500.0);
        assert_eq!(form.entries().len(), form.settings().entry_count as usize);
        assert!(form.store().get(SETTINGS_KEY).is_some());
    }

    #[test]
    fn test_restore_other_symbol_starts_fresh() {
        let form = form();
        let store = form.store().clone();
        let restored = LadderForm::restore(store, None, "SOLUSDT");
        assert_eq!(restored.settings().symbol, "SOLUSDT");
        assert_eq!(restored.settings().first_entry_price, 150.0);
    }

    #[test]
    fn test_reset_after_submit_keeps_symbol_and_direction() {
        let mut form = form();
        form.apply(SettingsEdit::Direction(Direction::Short));
        form.apply(SettingsEdit::EntryType(EntryType::Market));
        form.apply(SettingsEdit::Leverage(50));

        form.reset_after_submit(None);
        assert_eq!(form.settings().symbol, "BTCUSDT");
        assert_eq!(form.settings().direction, Direction::Short);
        assert_eq!(form.settings().leverage, 10);
        assert_eq!(form.settings().entry_type, EntryType::Limit);
        assert_eq!(form.settings().first_entry_price, 100.0);
    }

    #[test]
    fn test_select_symbol_reseeds_price() {
        let mut form = form();
        let feed = StaticPriceFeed::new().with_price("ETHUSDT", 3100.0);
        form.select_symbol("ethusdt", Some(&feed));
        assert_eq!(form.settings().symbol, "ETHUSDT");
        assert_eq!(form.settings().first_entry_price, 3100.0);
        assert_eq!(form.entries()[0].price, 3100.0);
    }

    #[test]
    fn test_refresh_price_keeps_last_on_failure() {
        let mut form = form();
        form.refresh_price(Some(&StaticPriceFeed::new()));
        assert_eq!(form.settings().first_entry_price, 100.0);
    }
}
