//! Rangefinder Firmware — Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters / drivers                        │
//! │                                                              │
//! │  echo ISR (hw_init)   esp_timer (hw_timer)   Esp32Clock      │
//! │  TriggerDriver (PinDriver + Ets)             LogEventSink    │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────        │
//! │                                                              │
//! │  ┌──────────────────────────┐   ┌────────────────────────┐   │
//! │  │ ranging core (ISR side)  │──▶│ RangingService (loop)  │   │
//! │  │ capture · timeout · cell │   │ trigger · wait · report│   │
//! │  └──────────────────────────┘   └────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use rangefinder::adapters::log_sink::LogEventSink;
use rangefinder::adapters::time::Esp32Clock;
use rangefinder::app::service::RangingService;
use rangefinder::config::RangerConfig;
use rangefinder::drivers::hw_init::{self, ECHO};
use rangefinder::drivers::hw_timer;
use rangefinder::drivers::trigger::TriggerDriver;
use rangefinder::error::{Error, SensorError};
use rangefinder::pins;

/// Ranging cycles between STATS log lines.
const STATS_EVERY_CYCLES: u32 = 60;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Rangefinder v{}", env!("CARGO_PKG_VERSION"));

    let config = RangerConfig::default();
    if let Err(e) = config.validate() {
        anyhow::bail!("invalid config: {e}");
    }
    info!("Config: {}", serde_json::to_string(&config)?);

    // ── 2. Peripherals ────────────────────────────────────────
    // Order matters: the timer must exist before the ISR can arm it.
    hw_init::init_peripherals()?;
    hw_timer::init_timeout_timer()?;
    hw_init::init_isr_service()?;

    // The HAL hands out pins by name; keep it in step with `pins`.
    const _: () = assert!(pins::TRIGGER_GPIO == 15);
    let peripherals = Peripherals::take()?;
    let trigger_pin = PinDriver::output(peripherals.pins.gpio15)?;
    let mut trigger = TriggerDriver::new(trigger_pin, Ets, config.trigger_pulse_us)
        .map_err(Error::from)?;
    info!(
        "Trigger on GPIO{} ({}us pulse), echo on GPIO{}",
        pins::TRIGGER_GPIO,
        trigger.pulse_us(),
        pins::ECHO_GPIO
    );

    // ── 3. Service ────────────────────────────────────────────
    let clock = Esp32Clock::new();
    let mut delay = FreeRtos;
    let mut sink = LogEventSink::new();
    let cycle_ms = config.cycle_interval_ms;
    let mut service = RangingService::new(&ECHO, config);
    service.start(&mut sink);

    info!("System ready. Entering ranging loop.");

    // ── 4. Ranging loop ───────────────────────────────────────
    loop {
        match service.run_cycle(&mut trigger, &mut delay, &clock, &mut sink) {
            Ok(_) | Err(Error::Sensor(SensorError::Timeout)) => {}
            Err(e) => warn!("ranging cycle failed: {}", e),
        }

        let stats = service.stats();
        if stats.cycles % STATS_EVERY_CYCLES == 0 {
            info!(
                "STATS | up={}ms cycles={} readings={} timeouts={} no_echo={} drained={}",
                clock.uptime_ms(),
                stats.cycles,
                stats.readings,
                stats.timeouts,
                stats.no_echo,
                stats.drained
            );
        }

        FreeRtos::delay_ms(cycle_ms);
    }
}
