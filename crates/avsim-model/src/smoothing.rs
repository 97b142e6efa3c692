//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Rate-limited smoothing primitive shared by subsystem updates."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---

/// Move `current` toward `target` by at most `rate * dt`.
///
/// Never overshoots the target and never jumps: the absolute change per call is
/// bounded by `rate * dt`. A negative `rate` or `dt` yields no movement.
pub fn approach(current: f64, target: f64, rate: f64, dt: f64) -> f64 {
    let delta = target - current;
    let max_step = (rate * dt).max(0.0);
    if delta.abs() <= max_step {
        target
    } else {
        current + delta.signum() * max_step
    }
}

/// Clamp a percentage into `[0, 100]`.
pub fn clamp_pct(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_by_rate_when_far() {
        assert_eq!(approach(0.0, 100.0, 8.0, 1.0), 8.0);
        assert_eq!(approach(100.0, 0.0, 8.0, 0.5), 96.0);
    }

    #[test]
    fn snaps_to_target_when_close() {
        assert_eq!(approach(99.0, 100.0, 8.0, 1.0), 100.0);
    }

    #[test]
    fn zero_dt_is_stationary() {
        assert_eq!(approach(42.0, 100.0, 8.0, 0.0), 42.0);
        assert_eq!(approach(42.0, 100.0, 8.0, -1.0), 42.0);
    }
}
