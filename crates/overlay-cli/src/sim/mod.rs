//! Feed simulation helpers.

use std::time::Duration;

use anyhow::{bail, Result};

pub mod paths;
pub mod payload;

pub use paths::{CircularPath, TrackPath};
pub use payload::{observation_payload, PayloadStyle};

/// Fastest update rate the simulator will stream at.
pub const MAX_RATE_HZ: f64 = 100.0;

/// Interval between updates for a rate in Hz.
pub fn update_period(rate_hz: f64) -> Result<Duration> {
    if !rate_hz.is_finite() || rate_hz <= 0.0 || rate_hz > MAX_RATE_HZ {
        bail!("rate must be in (0, {}] Hz, got {}", MAX_RATE_HZ, rate_hz);
    }
    Ok(Duration::from_secs_f64(1.0 / rate_hz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_period_accepts_sane_rates() {
        assert_eq!(update_period(2.0).unwrap(), Duration::from_millis(500));
        assert_eq!(update_period(MAX_RATE_HZ).unwrap(), Duration::from_millis(10));
    }

    #[test]
    fn update_period_rejects_degenerate_rates() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e12] {
            assert!(update_period(rate).is_err(), "rate {} accepted", rate);
        }
    }
}
