//! Echo-timing core.
//!
//! Times the width of the ultrasonic echo pulse from interrupt context and
//! hands the result to the foreground loop.
//!
//! ```text
//!   echo GPIO ISR ──▶ EdgeCapture ──┐
//!                        │ arm/cancel│ complete
//!                        ▼           ▼
//!   esp_timer cb ──▶ TimeoutGuard ─▶ MeasurementCell ◀── try_take ── RangingService
//!                              fail      (static)        can_trigger
//! ```
//!
//! The [`MeasurementCell`] is the only shared mutable resource.  Each
//! transition is owned by exactly one caller role, and the two roles that
//! race (falling edge, timeout fire) both resolve through a single
//! compare-exchange out of `Armed`, so whichever runs second is a no-op.

pub mod capture;
pub mod state;
pub mod timeout;

pub use capture::{EchoLevel, EdgeCapture};
pub use state::{MeasurementCell, MeasurementState, Outcome, PulseWidth};
pub use timeout::{TimeoutGuard, on_timeout_fired};

/// Time allowed between the rising and falling echo edge (30 ms ≈ 5 m).
pub const SENSOR_TIMEOUT_US: u32 = 30_000;
