//! Measurement sequencer — the shared state word and its transition API.
//!
//! ```text
//!            rise              fall
//!   Idle ──────────▶ Armed ──────────▶ Completed(width)
//!    ▲                 │                     │
//!    │                 │ timeout             │
//!    │                 ▼                     │
//!    └──── try_take ─ Failed ◀───────────────┘ try_take
//! ```
//!
//! Every field is an atomic so the cell can live in a `static` shared by
//! the echo ISR, the timer callback and the main loop.  Only 32-bit atomics
//! are used: the Xtensa cores have no native 64-bit CAS.
//!
//! Publication order: payload fields (rise timestamp, width) are written
//! first with `Relaxed`, the state word last with `Release`.  Readers load
//! the state with `Acquire` before touching the payload.

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use crate::app::ports::TimeoutHandle;
use crate::error::SensorError;

// Raw encodings of the state word.  `RESOLVING` is a transient claimed by
// the falling-edge handler while it writes the width; it reads as `Armed`.
const IDLE: u8 = 0;
const ARMED: u8 = 1;
const RESOLVING: u8 = 2;
const COMPLETED: u8 = 3;
const FAILED: u8 = 4;

/// No timeout attached to the current episode.
const NO_TIMEOUT: u32 = 0;

/// Width of one echo pulse in microseconds.  Zero is a valid width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PulseWidth(u32);

impl PulseWidth {
    pub const ZERO: Self = Self(0);

    pub const fn from_micros(us: u32) -> Self {
        Self(us)
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }
}

/// Snapshot of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementState {
    /// Ready for a new trigger.
    Idle,
    /// Rising edge seen, timeout pending.
    Armed,
    /// Falling edge seen in time; waiting to be consumed.
    Completed(PulseWidth),
    /// Timeout fired before the falling edge; waiting to be consumed.
    Failed,
}

/// What the consumer takes out of a resolved cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(PulseWidth),
    Failed,
}

impl Outcome {
    pub fn into_result(self) -> Result<PulseWidth, SensorError> {
        match self {
            Self::Completed(width) => Ok(width),
            Self::Failed => Err(SensorError::Timeout),
        }
    }
}

/// The process-wide measurement state.
///
/// Fields are private; all mutation goes through the transition methods,
/// each of which is a no-op when called from the wrong state.
pub struct MeasurementCell {
    state: AtomicU8,
    /// Rising-edge timestamp (µs, truncated).  Meaningful while armed.
    rise_us: AtomicU32,
    /// Payload of `Completed`.
    width_us: AtomicU32,
    /// Raw [`TimeoutHandle`] of the pending guard, or `NO_TIMEOUT`.
    timeout: AtomicU32,
}

impl Default for MeasurementCell {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementCell {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            rise_us: AtomicU32::new(0),
            width_us: AtomicU32::new(0),
            timeout: AtomicU32::new(NO_TIMEOUT),
        }
    }

    /// Current state.  A falling edge that is mid-resolution reads as
    /// `Armed`.
    pub fn state(&self) -> MeasurementState {
        match self.state.load(Ordering::Acquire) {
            IDLE => MeasurementState::Idle,
            COMPLETED => MeasurementState::Completed(PulseWidth(
                self.width_us.load(Ordering::Relaxed),
            )),
            FAILED => MeasurementState::Failed,
            _ => MeasurementState::Armed,
        }
    }

    /// Whether a trigger pulse may be emitted now.
    pub fn can_trigger(&self) -> bool {
        self.state.load(Ordering::Acquire) == IDLE
    }

    // ── Interrupt-side transitions ────────────────────────────

    /// `Idle → Armed` on a rising edge at `now_us`.
    ///
    /// Returns `false` (and leaves the timestamp untouched) unless the cell
    /// was idle.
    pub fn begin(&self, now_us: u32) -> bool {
        // Only the rising-edge handler leaves `Idle`, so once we see it here
        // nobody else can change the state before the exchange below.
        if self.state.load(Ordering::Acquire) != IDLE {
            return false;
        }
        self.rise_us.store(now_us, Ordering::Relaxed);
        self.timeout.store(NO_TIMEOUT, Ordering::Relaxed);
        self.state
            .compare_exchange(IDLE, ARMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record the guard armed for the current episode.
    ///
    /// Returns `false` when the episode resolved before the handle could be
    /// attached; the caller then owns the handle and must cancel it.
    pub fn attach_timeout(&self, handle: TimeoutHandle) -> bool {
        self.timeout.store(handle.get(), Ordering::Release);
        if self.state.load(Ordering::Acquire) == ARMED {
            return true;
        }
        // Resolved in between: take the handle back unless a resolver
        // already swapped it out.
        self.timeout
            .compare_exchange(handle.get(), NO_TIMEOUT, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
    }

    /// `Armed → Completed(now − rise)` on a falling edge at `now_us`.
    ///
    /// Returns `None` if the cell was not armed.  Otherwise returns the
    /// timeout handle that must now be cancelled (if one was attached).
    pub fn complete(&self, now_us: u32) -> Option<Option<TimeoutHandle>> {
        self.state
            .compare_exchange(ARMED, RESOLVING, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        let width = now_us.wrapping_sub(self.rise_us.load(Ordering::Relaxed));
        self.width_us.store(width, Ordering::Relaxed);
        let pending = self.timeout.swap(NO_TIMEOUT, Ordering::AcqRel);
        self.state.store(COMPLETED, Ordering::Release);

        Some(TimeoutHandle::new(pending))
    }

    /// `Armed → Failed` when the guard identified by `fired` expires.
    ///
    /// `fired == None` fails an episode that never got a guard attached.
    /// Any other handle must be the one attached to the current episode;
    /// a stale handle from an earlier episode is ignored, including one
    /// that lands before the new episode's guard is attached.
    pub fn expire(&self, fired: Option<TimeoutHandle>) -> bool {
        let current = self.timeout.load(Ordering::Acquire);
        if fired.map_or(NO_TIMEOUT, TimeoutHandle::get) != current {
            return false;
        }
        if self
            .state
            .compare_exchange(ARMED, FAILED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        // Leave the slot alone if a later episode has already attached.
        let _ = self.timeout.compare_exchange(
            current,
            NO_TIMEOUT,
            Ordering::AcqRel,
            Ordering::Relaxed,
        );
        true
    }

    // ── Foreground transition ─────────────────────────────────

    /// `Completed | Failed → Idle`, returning what was there.
    ///
    /// `None` while idle or armed.  This is the only way back to `Idle`.
    pub fn try_take(&self) -> Option<Outcome> {
        match self.state.load(Ordering::Acquire) {
            COMPLETED => {
                let width = PulseWidth(self.width_us.load(Ordering::Relaxed));
                self.release(COMPLETED).then_some(Outcome::Completed(width))
            }
            FAILED => self.release(FAILED).then_some(Outcome::Failed),
            _ => None,
        }
    }

    fn release(&self, from: u8) -> bool {
        self.state
            .compare_exchange(from, IDLE, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Rising-edge timestamp of the current episode, if armed.
    pub fn rise_timestamp(&self) -> Option<u32> {
        matches!(self.state.load(Ordering::Acquire), ARMED | RESOLVING)
            .then(|| self.rise_us.load(Ordering::Relaxed))
    }
}
