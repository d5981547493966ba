//! Type-aware equality of row field values.
//!
//! Values travel as text. Numbers that differ only by float rounding on one
//! side of the sync (e.g. `9.8` vs `9.80`, or a value that lost its last bit
//! in a JSON round trip) must not be reported as changes.

use rowsync_core::constants::MAX_NUMERIC_ULP_STEPS;
use rowsync_core::row::ElementDataType;

/// Whether a local and a server value are the same for merge purposes.
pub fn identical(local: Option<&str>, server: Option<&str>, data_type: ElementDataType) -> bool {
    match (local, server) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(l), Some(s)) if l == s => true,
        (Some(l), Some(s)) => data_type == ElementDataType::Number && numbers_match(l, s),
    }
}

fn numbers_match(local: &str, server: &str) -> bool {
    let (Ok(mut x), Ok(target)) = (local.trim().parse::<f64>(), server.trim().parse::<f64>()) else {
        return false;
    };
    // Covers equal infinities too.
    if x == target {
        return true;
    }
    if !x.is_finite() || !target.is_finite() {
        return false;
    }
    for _ in 0..MAX_NUMERIC_ULP_STEPS {
        x = next_toward(x, target);
        if x == target {
            return true;
        }
    }
    false
}

/// The adjacent representable f64 after `x` in the direction of `target`.
fn next_toward(x: f64, target: f64) -> f64 {
    if x == target {
        return target;
    }
    if x == 0.0 {
        let tiny = f64::from_bits(1);
        return if target > 0.0 { tiny } else { -tiny };
    }
    let bits = x.to_bits();
    // Magnitude grows when moving away from zero.
    let away_from_zero = (target > x) == (x > 0.0);
    f64::from_bits(if away_from_zero { bits + 1 } else { bits - 1 })
}
