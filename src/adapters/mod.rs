//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter    | Implements      | Connects to              |
//! |------------|-----------------|--------------------------|
//! | `log_sink` | EventSink       | Serial log output        |
//! | `time`     | MonotonicClock  | ESP32 system timer       |
//!
//! The alarm and trigger adapters live in [`crate::drivers`] next to the
//! peripheral code they wrap.

pub mod log_sink;
pub mod time;
