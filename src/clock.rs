//! Accelerated simulation time.

use chrono::{DateTime, Duration, Utc};

use crate::error::ConfigError;

/// Maps wall-clock time onto simulated time by scaling the elapsed interval
/// since `start` with a fixed `rate`. Restarting the process restarts the
/// clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    start: DateTime<Utc>,
    rate: f64,
}

impl SimulationClock {
    pub fn new(start: DateTime<Utc>, rate: f64) -> Result<Self, ConfigError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidTimeRate(rate));
        }
        Ok(Self { start, rate })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Simulated time corresponding to the wall-clock instant `now`.
    pub fn game_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed_ms = (now - self.start).num_milliseconds() as f64;
        let scaled = Duration::milliseconds((elapsed_ms * self.rate).round() as i64);
        self.start + scaled
    }
}
