//! Foreground side of the rangefinder — result consumption, zero direct I/O.
//!
//! The [`service::RangingService`] decides when a trigger may fire, waits
//! for the ranging core to resolve, converts pulse widths to distance and
//! reports.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer testable without peripherals.

pub mod events;
pub mod ports;
pub mod service;
