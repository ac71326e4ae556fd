use super::types::StopLossBounds;
use crate::constants::{MAX_ENTRY_COUNT, MIN_UNIT_AMOUNT};

/// Martingale weights for `count` steps: `1, 1, 2, 4, 8, ...`.
///
/// The first two steps share the base weight; every later step doubles the
/// previous one.
pub fn martingale_weights(count: u32) -> Vec<f64> {
    (0..count)
        .map(|j| if j == 0 { 1.0 } else { 2f64.powi(j as i32 - 1) })
        .collect()
}

/// Sum of the first `count` martingale weights, `W(n)`.
///
/// Equals `2^(n-1)` for `n >= 1` and `0` for `n == 0`.
pub fn weight_sum(count: u32) -> f64 {
    martingale_weights(count).iter().sum()
}

/// Largest step count in `[1, MAX_ENTRY_COUNT]` whose unit allocation
/// `total_budget / W(n)` stays above [`MIN_UNIT_AMOUNT`].
///
/// * `total_budget` - Leverage-exclusive notional to spread over the ladder.
/// * `base_price` - First entry price. Only checked for positivity.
///
/// The scan stops at the first failing count. That is exact for the doubling
/// weights because `W(n)` strictly increases with `n`.
pub fn calculate_max_entry_count(total_budget: f64, base_price: f64) -> u32 {
    if total_budget.is_nan() || total_budget <= 0.0 || base_price.is_nan() || base_price <= 0.0 {
        return 1;
    }

    let mut max_count = 1;
    for n in 2..=MAX_ENTRY_COUNT {
        let unit = total_budget / weight_sum(n);
        if unit > MIN_UNIT_AMOUNT {
            max_count = n;
        } else {
            break;
        }
    }
    max_count
}

/// Stop-loss floor and suggested default for a ladder.
///
/// The last step fills `entry_count * price_deviation` percent away from the
/// first price, so a tighter stop would exit before the ladder completes.
pub fn compute_stop_loss_bounds(entry_count: u32, price_deviation: f64) -> StopLossBounds {
    let deviation = if price_deviation.is_finite() {
        price_deviation.max(0.0)
    } else {
        0.0
    };
    StopLossBounds {
        min_stop_loss: entry_count as f64 * deviation,
        default_stop_loss: (entry_count as f64 + 1.0) * deviation,
    }
}
