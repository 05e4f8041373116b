//! System configuration parameters
//!
//! All tunable parameters for the rangefinder.  Defaults match the
//! HC-SR04 datasheet timing; nothing is persisted.  The echo timeout
//! window is fixed at [`SENSOR_TIMEOUT_US`] and is not configurable.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ranging::SENSOR_TIMEOUT_US;

/// Minimum trigger pulse width the HC-SR04 recognises (microseconds).
pub const MIN_TRIGGER_PULSE_US: u32 = 10;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangerConfig {
    // --- Trigger ---
    /// Width of the trigger pulse (microseconds)
    pub trigger_pulse_us: u32,

    // --- Conversion ---
    /// Round-trip microseconds per centimetre of distance
    pub us_per_cm: u32,

    // --- Timing ---
    /// Sleep between result polls in the foreground loop (milliseconds)
    pub poll_interval_ms: u32,
    /// Longest the foreground loop waits for an outcome after a trigger
    /// (milliseconds).  Covers a sensor that never raises the echo line.
    pub echo_wait_ms: u32,
    /// Pause between ranging cycles (milliseconds)
    pub cycle_interval_ms: u32,
}

impl Default for RangerConfig {
    fn default() -> Self {
        Self {
            // Trigger
            trigger_pulse_us: MIN_TRIGGER_PULSE_US,

            // Conversion
            us_per_cm: 58,

            // Timing
            poll_interval_ms: 10,
            echo_wait_ms: 100,
            cycle_interval_ms: 1000, // 1 Hz
        }
    }
}

impl RangerConfig {
    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.trigger_pulse_us < MIN_TRIGGER_PULSE_US {
            return Err(Error::Config("trigger_pulse_us below sensor minimum"));
        }
        if self.us_per_cm == 0 {
            return Err(Error::Config("us_per_cm must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero"));
        }
        if u64::from(self.echo_wait_ms) * 1000 <= u64::from(SENSOR_TIMEOUT_US) {
            return Err(Error::Config("echo_wait_ms must exceed the timeout window"));
        }
        Ok(())
    }
}
