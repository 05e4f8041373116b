//! Port traits — the hexagonal boundary between the ranging core and the
//! platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ranging core / RangingService
//! ```
//!
//! Driven adapters (clock, alarm, trigger line, event sinks) implement these
//! traits.  The ranging core and [`RangingService`](super::service::RangingService)
//! consume them via generics, so neither touches hardware directly.
//!
//! ## Interrupt-context notes
//!
//! [`MonotonicClock`] and [`TimeoutAlarm`] are called from the echo ISR.
//! Implementations must return promptly and must not block, allocate or log.

use core::num::NonZeroU32;

use crate::error::TriggerError;

use super::events::RangingEvent;

// ───────────────────────────────────────────────────────────────
// Monotonic clock
// ───────────────────────────────────────────────────────────────

/// Microsecond timestamps that never go backwards.
pub trait MonotonicClock {
    /// Microseconds since an arbitrary fixed origin (usually boot).
    fn now_us(&self) -> u64;

    /// Microseconds elapsed since `since_us`.  Saturates at zero if the
    /// caller hands in a timestamp from the future.
    fn elapsed_us(&self, since_us: u64) -> u64 {
        self.now_us().saturating_sub(since_us)
    }
}

// ───────────────────────────────────────────────────────────────
// Deferred one-shot callback (alarm)
// ───────────────────────────────────────────────────────────────

/// Identifies one arming of a [`TimeoutAlarm`].
///
/// Never zero, so the sequencer can use zero as "no timeout attached".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(NonZeroU32);

impl TimeoutHandle {
    /// Wrap a raw identifier.  Returns `None` for zero.
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// The raw identifier (never zero).
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// One-shot deferred callback with best-effort cancellation.
///
/// When an armed alarm expires, the platform must call
/// [`on_timeout_fired`](crate::ranging::timeout::on_timeout_fired) with the
/// handle returned by the matching `arm`.
pub trait TimeoutAlarm {
    /// Schedule a fire `delay_us` from now.  Returns `None` if the platform
    /// could not schedule it.
    fn arm(&self, delay_us: u32) -> Option<TimeoutHandle>;

    /// Cancel a pending fire.  Best-effort: the fire may still be delivered
    /// if it was already in flight.
    fn cancel(&self, handle: TimeoutHandle);
}

// ───────────────────────────────────────────────────────────────
// Trigger line (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Starts a ranging cycle on the sensor.
pub trait TriggerPort {
    /// Drive the trigger line high for the configured width, then low.
    fn pulse(&mut self) -> Result<(), TriggerError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / output)
// ───────────────────────────────────────────────────────────────

/// The consumer emits structured [`RangingEvent`]s through this port.
/// Adapters decide where they go (serial log, display, radio, ...).
pub trait EventSink {
    fn emit(&mut self, event: &RangingEvent);
}
