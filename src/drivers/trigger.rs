//! Trigger-line driver.
//!
//! The sensor starts a ranging cycle on a HIGH pulse of at least 10 µs.
//! Generic over `embedded-hal` 1.0 traits: on device the pin is an
//! `esp_idf_hal` `PinDriver<Output>` and the delay is `Ets` (ROM busy-wait,
//! microsecond accurate).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::TriggerPort;
use crate::error::TriggerError;

pub struct TriggerDriver<P, D> {
    pin: P,
    delay: D,
    pulse_us: u32,
}

impl<P: OutputPin, D: DelayNs> TriggerDriver<P, D> {
    /// Take ownership of the trigger pin and drive it low so every pulse
    /// starts from a known level.
    pub fn new(mut pin: P, delay: D, pulse_us: u32) -> Result<Self, TriggerError> {
        pin.set_low().map_err(|_| TriggerError::GpioWriteFailed)?;
        Ok(Self {
            pin,
            delay,
            pulse_us,
        })
    }

    pub fn pulse_us(&self) -> u32 {
        self.pulse_us
    }

}

impl<P: OutputPin, D: DelayNs> TriggerPort for TriggerDriver<P, D> {
    fn pulse(&mut self) -> Result<(), TriggerError> {
        self.pin.set_high().map_err(|_| TriggerError::GpioWriteFailed)?;
        self.delay.delay_us(self.pulse_us);
        self.pin.set_low().map_err(|_| TriggerError::GpioWriteFailed)
    }
}
