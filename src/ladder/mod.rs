//! Martingale ladder math: weights, step count ceiling, stop-loss floor and
//! the ladder itself. Everything here is pure.

pub mod calculator;
pub mod common;
pub mod types;

pub use calculator::{compute_ladder, compute_reverse_ladder, resize_ladder};
pub use common::{calculate_max_entry_count, compute_stop_loss_bounds};
pub use types::{Direction, EntryStep, EntryType, StopLossBounds};
