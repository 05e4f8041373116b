//! One-shot echo timeout alarm on ESP-IDF's esp_timer API.
//!
//! A single esp_timer is created at boot and re-armed for every rising
//! edge.  Each arm bumps a generation counter that doubles as the
//! [`TimeoutHandle`], so a late fire can be told apart from the current
//! episode.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so the
//! echo ISR may preempt them; the measurement cell's compare-exchange
//! settles who resolves.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::{TimeoutAlarm, TimeoutHandle};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut TIMEOUT_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: TIMEOUT_TIMER is written once in `init_timeout_timer()` before
/// the echo ISR is registered; afterwards it is only read.
#[cfg(target_os = "espidf")]
unsafe fn timeout_timer() -> esp_timer_handle_t {
    unsafe { TIMEOUT_TIMER }
}

/// The process-wide timeout alarm used by the echo ISR.
pub static TIMEOUT_ALARM: EspTimeoutAlarm = EspTimeoutAlarm::new();

/// [`TimeoutAlarm`] backed by the esp_timer created in
/// [`init_timeout_timer`].
pub struct EspTimeoutAlarm {
    generation: AtomicU32,
}

impl Default for EspTimeoutAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl EspTimeoutAlarm {
    pub const fn new() -> Self {
        Self {
            generation: AtomicU32::new(0),
        }
    }

    /// Handle of the most recent arm, if any.
    pub fn current(&self) -> Option<TimeoutHandle> {
        TimeoutHandle::new(self.generation.load(Ordering::Acquire))
    }

    fn next_generation(&self) -> TimeoutHandle {
        loop {
            let raw = self.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
            if let Some(handle) = TimeoutHandle::new(raw) {
                return handle;
            }
        }
    }
}

impl TimeoutAlarm for EspTimeoutAlarm {
    #[cfg(target_os = "espidf")]
    fn arm(&self, delay_us: u32) -> Option<TimeoutHandle> {
        // SAFETY: timeout_timer() contract — created before any arm.
        let timer = unsafe { timeout_timer() };
        if timer.is_null() {
            return None;
        }
        let handle = self.next_generation();
        // SAFETY: `timer` is a valid esp_timer handle.  Stopping an idle
        // timer returns ESP_ERR_INVALID_STATE, which is fine to ignore.
        unsafe {
            esp_timer_stop(timer);
            if esp_timer_start_once(timer, u64::from(delay_us)) != ESP_OK as i32 {
                return None;
            }
        }
        Some(handle)
    }

    #[cfg(not(target_os = "espidf"))]
    fn arm(&self, _delay_us: u32) -> Option<TimeoutHandle> {
        Some(self.next_generation())
    }

    fn cancel(&self, handle: TimeoutHandle) {
        if self.current() != Some(handle) {
            return;
        }
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: timeout_timer() contract; esp_timer_stop on a stopped
            // timer is a harmless ESP_ERR_INVALID_STATE.
            unsafe {
                let timer = timeout_timer();
                if !timer.is_null() {
                    esp_timer_stop(timer);
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn timeout_cb(_arg: *mut core::ffi::c_void) {
    use crate::drivers::hw_init::ECHO;
    use crate::ranging::SENSOR_TIMEOUT_US;

    // A fire dispatched just before a re-arm reads the new generation;
    // reject it if the current episode has not run its full window yet.
    if let Some(rise) = ECHO.rise_timestamp() {
        // SAFETY: esp_timer_get_time is callable from the timer task.
        let now = unsafe { esp_timer_get_time() } as u32;
        if now.wrapping_sub(rise) < SENSOR_TIMEOUT_US {
            return;
        }
    }
    if let Some(handle) = TIMEOUT_ALARM.current() {
        crate::ranging::on_timeout_fired(&ECHO, handle);
    }
}

/// Create the one-shot timeout timer.  Call once, before the echo ISR is
/// installed.
#[cfg(target_os = "espidf")]
pub fn init_timeout_timer() -> Result<(), super::hw_init::HwInitError> {
    // SAFETY: TIMEOUT_TIMER is written here once at boot from the single
    // main-task context before the echo ISR can arm it.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(timeout_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"echo_timeout\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut TIMEOUT_TIMER);
        if ret != ESP_OK as i32 {
            return Err(super::hw_init::HwInitError::TimerCreateFailed(ret));
        }
    }
    info!("hw_timer: echo timeout timer created");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_timeout_timer() -> Result<(), super::hw_init::HwInitError> {
    log::info!("hw_timer(sim): timeout timer not created (no echo ISR on host)");
    Ok(())
}
