/// Decide whether a computed PG target differs enough from the current one
/// to act on. Small drift is ignored; only a divergence beyond the
/// hysteresis factor (in either direction) triggers a change, and only when
/// the granted ratio is sane.
pub fn would_adjust(
    final_pg_target: u32,
    pg_num_target: u32,
    final_ratio: f64,
    threshold: f64,
) -> bool {
    let current = f64::from(pg_num_target);
    let target = f64::from(final_pg_target);
    let diverged = target > current * threshold || target < current / threshold;
    diverged && (0.0..=1.0).contains(&final_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_drift_is_ignored() {
        assert!(!would_adjust(64, 32, 0.5, 3.0));
        assert!(!would_adjust(16, 32, 0.5, 3.0));
        assert!(!would_adjust(32, 32, 0.5, 3.0));
    }

    #[test]
    fn test_large_divergence_adjusts() {
        assert!(would_adjust(128, 32, 0.5, 3.0));
        assert!(would_adjust(8, 32, 0.5, 3.0));
    }

    #[test]
    fn test_ratio_out_of_bounds_blocks() {
        assert!(!would_adjust(128, 32, 1.2, 3.0));
        assert!(!would_adjust(128, 32, -0.1, 3.0));
        assert!(would_adjust(128, 32, 1.0, 3.0));
        assert!(would_adjust(128, 32, 0.0, 3.0));
    }

    #[test]
    fn test_next_power_crosses_default_threshold() {
        // With powers of two and threshold >= 2, two steps in either
        // direction always cross the gate.
        for exp in 2..16u32 {
            let current = 1 << exp;
            assert!(would_adjust(current << 2, current, 0.5, 3.0));
            assert!(would_adjust(current >> 2, current, 0.5, 3.0));
        }
    }
}
