//! Edge capture — the echo-line interrupt handler.
//!
//! Invoked on every transition of the echo input with the observed level.
//! Never blocks, never logs: it samples the clock, performs at most one
//! transition on the [`MeasurementCell`] and arms or cancels the timeout.

use crate::app::ports::{MonotonicClock, TimeoutAlarm};

use super::state::MeasurementCell;
use super::timeout::TimeoutGuard;

/// Level of the echo line after an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoLevel {
    High,
    Low,
}

impl From<bool> for EchoLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Borrowed view of everything the echo ISR needs.  Cheap to build on
/// every interrupt.
pub struct EdgeCapture<'a, C, A> {
    cell: &'a MeasurementCell,
    clock: &'a C,
    guard: TimeoutGuard<'a, A>,
}

impl<'a, C: MonotonicClock, A: TimeoutAlarm> EdgeCapture<'a, C, A> {
    pub const fn new(cell: &'a MeasurementCell, clock: &'a C, alarm: &'a A, window_us: u32) -> Self {
        Self {
            cell,
            clock,
            guard: TimeoutGuard::new(alarm, window_us),
        }
    }

    /// Handle one edge of the echo line.
    pub fn on_edge(&self, level: EchoLevel) {
        match level {
            EchoLevel::High => self.on_rise(),
            EchoLevel::Low => self.on_fall(),
        }
    }

    fn on_rise(&self) {
        let now = self.clock.now_us() as u32;
        // Rise while armed or unconsumed: keep the original timestamp.
        if self.cell.begin(now) {
            self.guard.arm(self.cell);
        }
    }

    fn on_fall(&self) {
        let now = self.clock.now_us() as u32;
        // The cell is already Completed when we cancel, so a fire that slips
        // past the cancel finds nothing armed.
        if let Some(Some(pending)) = self.cell.complete(now) {
            self.guard.cancel(pending);
        }
    }
}
