//! Outbound application events.
//!
//! The [`RangingService`](super::service::RangingService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use crate::ranging::PulseWidth;

/// Structured events emitted by the result consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingEvent {
    /// The service has started (carries the timeout window in µs).
    Started { timeout_us: u32 },

    /// A measurement completed.
    Distance(Reading),

    /// A measurement timed out (no echo, or echo never ended).
    SensorFailure,
}

/// A converted measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Raw echo pulse width.
    pub width: PulseWidth,
    /// Distance in whole centimetres (truncated).
    pub distance_cm: u32,
}

impl Reading {
    /// Convert a pulse width using `us_per_cm` round-trip microseconds per
    /// centimetre.
    pub fn from_width(width: PulseWidth, us_per_cm: u32) -> Self {
        Self {
            width,
            distance_cm: width.as_micros() / us_per_cm.max(1),
        }
    }
}
