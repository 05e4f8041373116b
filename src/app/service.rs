//! Application service — the result consumer.
//!
//! [`RangingService`] owns the foreground half of the measurement cycle:
//! it gates the trigger on the sequencer being idle, waits (cooperatively)
//! for the ranging core to resolve, converts the pulse width and reports
//! through an [`EventSink`].
//!
//! ```text
//!  TriggerPort ◀── ┌──────────────────────┐ ──▶ EventSink
//!                  │    RangingService    │
//!  DelayNs ◀────── │ trigger · wait · take│ ◀── MeasurementCell
//!                  └──────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::RangerConfig;
use crate::error::{Error, Result, SensorError, TriggerError};
use crate::ranging::{MeasurementCell, Outcome, SENSOR_TIMEOUT_US};

use super::events::{RangingEvent, Reading};
use super::ports::{EventSink, MonotonicClock, TriggerPort};

/// Running counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangingStats {
    /// Calls to `run_cycle`, whatever their result.
    pub cycles: u32,
    /// Measurements that completed with a pulse width.
    pub readings: u32,
    /// Measurements the timeout guard failed.
    pub timeouts: u32,
    /// Cycles abandoned because no outcome appeared within `echo_wait_ms`.
    pub no_echo: u32,
    /// Cycles that skipped the trigger to drain an in-flight measurement.
    pub drained: u32,
}

/// The result consumer and trigger gate.
pub struct RangingService<'a> {
    cell: &'a MeasurementCell,
    config: RangerConfig,
    stats: RangingStats,
}

impl<'a> RangingService<'a> {
    /// Construct the service over the shared measurement cell.
    pub fn new(cell: &'a MeasurementCell, config: RangerConfig) -> Self {
        Self {
            cell,
            config,
            stats: RangingStats::default(),
        }
    }

    /// Announce the service on the sink.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "RangingService: started (timeout={}us, poll={}ms)",
            SENSOR_TIMEOUT_US, self.config.poll_interval_ms
        );
        sink.emit(&RangingEvent::Started {
            timeout_us: SENSOR_TIMEOUT_US,
        });
    }

    pub fn config(&self) -> &RangerConfig {
        &self.config
    }

    pub fn stats(&self) -> RangingStats {
        self.stats
    }

    /// Emit a trigger pulse if, and only if, the sequencer is idle.
    pub fn trigger(&self, trigger: &mut impl TriggerPort) -> Result<()> {
        if !self.cell.can_trigger() {
            return Err(TriggerError::Busy.into());
        }
        trigger.pulse()?;
        Ok(())
    }

    /// Run one full measurement cycle.
    ///
    /// 1. Trigger (or skip the trigger if a measurement is still in flight).
    /// 2. Poll the cell every `poll_interval_ms` until it resolves or
    ///    `echo_wait_ms` passes.
    /// 3. Convert and report.
    pub fn run_cycle<T, D, C, S>(
        &mut self,
        trigger: &mut T,
        delay: &mut D,
        clock: &C,
        sink: &mut S,
    ) -> Result<Reading>
    where
        T: TriggerPort,
        D: DelayNs,
        C: MonotonicClock,
        S: EventSink,
    {
        self.stats.cycles = self.stats.cycles.wrapping_add(1);
        match self.trigger(trigger) {
            Ok(()) => {}
            Err(Error::Trigger(TriggerError::Busy)) => {
                debug!("RangingService: measurement in flight, draining");
                self.stats.drained += 1;
            }
            Err(e) => return Err(e),
        }

        let outcome = self.await_outcome(delay, clock);
        self.report(outcome, sink)
    }

    /// Poll until the cell resolves or the wait budget runs out.
    ///
    /// Running out of budget means the echo line never rose, so no guard
    /// was ever armed; it is reported as a timeout without touching the
    /// sequencer.
    pub fn await_outcome<D, C>(&mut self, delay: &mut D, clock: &C) -> Option<Outcome>
    where
        D: DelayNs,
        C: MonotonicClock,
    {
        let started = clock.now_us();
        let budget_us = u64::from(self.config.echo_wait_ms) * 1000;

        loop {
            if let Some(outcome) = self.cell.try_take() {
                return Some(outcome);
            }
            if clock.elapsed_us(started) >= budget_us {
                return None;
            }
            delay.delay_ms(self.config.poll_interval_ms);
        }
    }

    fn report<S: EventSink>(&mut self, outcome: Option<Outcome>, sink: &mut S) -> Result<Reading> {
        match outcome.map(Outcome::into_result) {
            Some(Ok(width)) => {
                let reading = Reading::from_width(width, self.config.us_per_cm);
                self.stats.readings += 1;
                sink.emit(&RangingEvent::Distance(reading));
                Ok(reading)
            }
            Some(Err(e)) => {
                self.stats.timeouts += 1;
                sink.emit(&RangingEvent::SensorFailure);
                Err(e.into())
            }
            None => {
                warn!(
                    "RangingService: no echo within {}ms",
                    self.config.echo_wait_ms
                );
                self.stats.no_echo += 1;
                sink.emit(&RangingEvent::SensorFailure);
                Err(SensorError::Timeout.into())
            }
        }
    }
}
