//! Threshold-crossing detection.

/// Whether spending crossed `threshold` percent of `budget_amount` between
/// two snapshots.
///
/// A crossing means the previous percentage was strictly below the threshold
/// and the new one is at or above it. Returns `false` for a non-positive or
/// NaN budget, for NaN totals, and when the threshold already fired.
///
/// Each threshold is evaluated independently with its own
/// `already_triggered` flag.
pub fn evaluate(
    previous_total: f64,
    new_total: f64,
    budget_amount: f64,
    threshold: f64,
    already_triggered: bool,
) -> bool {
    // Also rejects a NaN budget.
    if !(budget_amount > 0.0) {
        return false;
    }
    if already_triggered {
        return false;
    }
    if previous_total.is_nan() || new_total.is_nan() {
        return false;
    }

    let previous_pct = previous_total / budget_amount * 100.0;
    let new_pct = new_total / budget_amount * 100.0;
    previous_pct < threshold && new_pct >= threshold
}
