use tracing::info;

/// Fraction of its subtree a pool occupies, counting reserved space: the
/// larger of what is stored and what `target_size_bytes` reserves, converted
/// to raw bytes.
pub fn pool_capacity_ratio(
    logical_used: u64,
    target_bytes: u64,
    raw_used_rate: f64,
    capacity: u64,
) -> f64 {
    let raw_used = logical_used.max(target_bytes) as f64 * raw_used_rate;
    raw_used / capacity as f64
}

/// Normalize a pool's `target_size_ratio` against the other ratios in its
/// subtree, then shrink it by the fraction of capacity already reserved
/// through `target_size_bytes`.
pub fn effective_target_ratio(
    target_ratio: f64,
    total_target_ratio: f64,
    total_target_bytes: f64,
    capacity: u64,
) -> f64 {
    let mut ratio = target_ratio;
    if total_target_ratio > 0.0 {
        ratio /= total_target_ratio;
    }
    if total_target_bytes > 0.0 && capacity > 0 {
        let fraction_available = 1.0 - (total_target_bytes / capacity as f64).min(1.0);
        ratio *= fraction_available;
    }
    info!(
        target_ratio,
        total_target_ratio, total_target_bytes, capacity, effective = ratio,
        "effective target ratio"
    );
    ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ratio_stays_zero() {
        assert_eq!(effective_target_ratio(0.0, 1.2, 1e9, 1 << 40), 0.0);
        assert_eq!(effective_target_ratio(0.0, 0.0, 0.0, 0), 0.0);
    }

    #[test]
    fn test_normalization_without_bytes() {
        // Two pools at 0.6 each: total 1.2, each effectively one half.
        assert!((effective_target_ratio(0.6, 1.2, 0.0, 1 << 40) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bytes_reservation_shrinks_ratio() {
        let capacity = 1u64 << 40;
        // Half the capacity reserved through target_size_bytes.
        let shrunk = effective_target_ratio(1.0, 1.0, capacity as f64 / 2.0, capacity);
        assert!((shrunk - 0.5).abs() < 1e-12);
        // Never exceeds the normalized ratio.
        assert!(shrunk <= 1.0);
    }

    #[test]
    fn test_reservation_can_zero_out() {
        let capacity = 1u64 << 30;
        // Overcommitted reservations cap fraction_available at zero.
        let ratio = effective_target_ratio(0.7, 0.7, capacity as f64 * 2.0, capacity);
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_capacity_ratio_takes_reservation_max() {
        let capacity = 1u64 << 30;
        let stored = 1u64 << 20;
        let reserved = 1u64 << 29;
        let ratio = pool_capacity_ratio(stored, reserved, 2.0, capacity);
        assert!((ratio - 1.0).abs() < 1e-12);
        // Stored dominates once it exceeds the reservation.
        let ratio = pool_capacity_ratio(reserved, stored, 2.0, capacity);
        assert!((ratio - 1.0).abs() < 1e-12);
    }
}
