//! ESP32 monotonic clock adapter.
//!
//! Implements [`MonotonicClock`] for the ranging core and the consumer.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic,
//!   safe to read from ISR context).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::app::ports::MonotonicClock;

/// Microsecond clock for the ESP32-S3 platform.
pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    /// `const` on device so the clock can sit in a `static` next to the
    /// measurement cell.
    #[cfg(target_os = "espidf")]
    pub const fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, truncated to `u32`.
    pub fn uptime_ms(&self) -> u32 {
        (self.now_us() / 1000) as u32
    }
}

impl MonotonicClock for Esp32Clock {
    #[cfg(target_os = "espidf")]
    fn now_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads the free-running system timer;
        // no preconditions, callable from ISR and task context.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
