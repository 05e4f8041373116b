//! Unified error types for the rangefinder firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! foreground loop's error handling uniform.  All variants are `Copy` so
//! they can be handed from the ranging core to the consumer without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A measurement did not produce a pulse width.
    Sensor(SensorError),
    /// The trigger line could not be driven.
    Trigger(TriggerError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Trigger(e) => write!(f, "trigger: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// The one way a measurement can fail.
///
/// A disconnected sensor, a target out of range and electrical noise are
/// indistinguishable from the echo line alone; all of them surface as
/// `Timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No falling edge arrived within the timeout window after a rising
    /// edge, or the echo line never rose at all.
    Timeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "echo timeout"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Trigger errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// A pulse was requested while a measurement was still unconsumed.
    Busy,
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::Busy => write!(f, "measurement in flight"),
        }
    }
}

impl From<TriggerError> for Error {
    fn from(e: TriggerError) -> Self {
        Self::Trigger(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
