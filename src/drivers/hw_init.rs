//! One-shot echo-pin initialisation and the echo ISR.
//!
//! Configures the echo GPIO as an any-edge interrupt input using raw
//! ESP-IDF sys calls and registers the handler that feeds the ranging
//! core.  The trigger pin is owned by an `esp_idf_hal` `PinDriver` in
//! `main` and is not touched here.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::ranging::MeasurementCell;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Shared measurement state ──────────────────────────────────

/// The one measurement cell, shared by the echo ISR, the timeout callback
/// and the foreground loop.
pub static ECHO: MeasurementCell = MeasurementCell::new();

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerAddFailed(i32),
    TimerCreateFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerAddFailed(rc) => write!(f, "echo ISR registration failed (rc={})", rc),
            Self::TimerCreateFailed(rc) => write!(f, "esp_timer create failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── Echo GPIO input ───────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::ECHO_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        // The sensor drives the line push-pull.
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    // SAFETY: Called once from main() before the ISR service is installed;
    // single-threaded.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: echo GPIO{} configured (any edge)", pins::ECHO_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
static CLOCK: crate::adapters::time::Esp32Clock = crate::adapters::time::Esp32Clock::new();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn echo_gpio_isr(_arg: *mut core::ffi::c_void) {
    use crate::drivers::hw_timer::TIMEOUT_ALARM;
    use crate::ranging::{EchoLevel, EdgeCapture, SENSOR_TIMEOUT_US};

    // SAFETY: gpio_get_level is a register read; safe in ISR context.
    let high = unsafe { gpio_get_level(pins::ECHO_GPIO) } != 0;
    EdgeCapture::new(&ECHO, &CLOCK, &TIMEOUT_ALARM, SENSOR_TIMEOUT_US)
        .on_edge(EchoLevel::from(high));
}

/// Install the GPIO ISR service and register the echo handler.
/// Call after `init_peripherals()` and `init_timeout_timer()`.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler only
    // touches atomics and the esp_timer API.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(pins::ECHO_GPIO, Some(echo_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrHandlerAddFailed(ret));
        }
        gpio_intr_enable(pins::ECHO_GPIO);
    }
    info!("hw_init: ISR service installed (echo)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
