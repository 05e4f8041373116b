//! Timeout guard — aborts a measurement whose falling edge never arrives.
//!
//! Armed on every accepted rising edge, cancelled by the falling edge.
//! Cancellation is optimistic: the platform may still deliver a fire that
//! was already in flight, so the fire handler re-checks the cell and does
//! nothing unless the same episode is still armed.

use crate::app::ports::{TimeoutAlarm, TimeoutHandle};

use super::state::MeasurementCell;

/// Arms and cancels the one pending timeout for a [`MeasurementCell`].
pub struct TimeoutGuard<'a, A> {
    alarm: &'a A,
    window_us: u32,
}

impl<'a, A: TimeoutAlarm> TimeoutGuard<'a, A> {
    pub const fn new(alarm: &'a A, window_us: u32) -> Self {
        Self { alarm, window_us }
    }

    /// Arm a fresh timeout for the episode that just started in `cell`.
    ///
    /// If the platform cannot schedule one, the episode is failed on the
    /// spot; an unguarded measurement would otherwise never leave `Armed`
    /// when the echo sticks high.
    pub fn arm(&self, cell: &MeasurementCell) {
        match self.alarm.arm(self.window_us) {
            Some(handle) => {
                if !cell.attach_timeout(handle) {
                    self.alarm.cancel(handle);
                }
            }
            None => {
                cell.expire(None);
            }
        }
    }

    /// Cancel the timeout handed back by a falling-edge resolution.
    pub fn cancel(&self, handle: TimeoutHandle) {
        self.alarm.cancel(handle);
    }
}

/// Fire handler.  Platform alarm callbacks call this with the handle they
/// were armed under.
///
/// Returns `true` if this fire resolved the measurement to `Failed`,
/// `false` if it lost the race to the falling edge (or is stale).
pub fn on_timeout_fired(cell: &MeasurementCell, handle: TimeoutHandle) -> bool {
    cell.expire(Some(handle))
}
