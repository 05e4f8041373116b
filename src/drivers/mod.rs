//! Peripheral drivers: echo-pin setup and ISR, timeout alarm, trigger pulse.

pub mod hw_init;
pub mod hw_timer;
pub mod trigger;
