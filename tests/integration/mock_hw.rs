//! Simulated sensor bench for integration tests.
//!
//! One object plays every platform role: monotonic clock, one-shot alarm,
//! and the physical echo line.  Time only moves when a test (or the
//! service's delay) advances it; scheduled echo edges and alarm expiries
//! are then dispatched in time order through the real ranging core.

use std::cell::{Cell, RefCell};

use embedded_hal::delay::DelayNs;
use rangefinder::app::events::RangingEvent;
use rangefinder::app::ports::{EventSink, MonotonicClock, TimeoutAlarm, TimeoutHandle, TriggerPort};
use rangefinder::error::TriggerError;
use rangefinder::ranging::{EchoLevel, EdgeCapture, MeasurementCell, SENSOR_TIMEOUT_US, on_timeout_fired};

/// How the simulated sensor answers a trigger pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoResponse {
    /// Echo rises `delay_us` after the trigger and stays high `width_us`.
    Echo { delay_us: u64, width_us: u64 },
    /// Echo rises and never falls.
    StuckHigh { delay_us: u64 },
    /// Echo never rises.
    Silent,
}

pub struct SimBench {
    pub cell: MeasurementCell,
    now_us: Cell<u64>,
    next_handle: Cell<u32>,
    pending_alarm: Cell<Option<(TimeoutHandle, u64)>>,
    edges: RefCell<Vec<(u64, EchoLevel)>>,
    pub response: Cell<EchoResponse>,
    /// When set, `cancel` is recorded but the alarm still fires.
    pub lossy_cancel: Cell<bool>,
    pub arms: Cell<u32>,
    pub cancels: Cell<u32>,
    pub fires: Cell<u32>,
    pub pulses: Cell<u32>,
}

#[allow(dead_code)]
impl SimBench {
    pub fn new() -> Self {
        Self {
            cell: MeasurementCell::new(),
            now_us: Cell::new(0),
            next_handle: Cell::new(0),
            pending_alarm: Cell::new(None),
            edges: RefCell::new(Vec::new()),
            response: Cell::new(EchoResponse::Silent),
            lossy_cancel: Cell::new(false),
            arms: Cell::new(0),
            cancels: Cell::new(0),
            fires: Cell::new(0),
            pulses: Cell::new(0),
        }
    }

    pub fn with_response(response: EchoResponse) -> Self {
        let bench = Self::new();
        bench.response.set(response);
        bench
    }

    pub fn capture(&self) -> EdgeCapture<'_, Self, Self> {
        EdgeCapture::new(&self.cell, self, self, SENSOR_TIMEOUT_US)
    }

    /// Deliver an edge right now.
    pub fn edge(&self, level: EchoLevel) {
        self.capture().on_edge(level);
    }

    pub fn schedule_edge(&self, at_us: u64, level: EchoLevel) {
        self.edges.borrow_mut().push((at_us, level));
    }

    pub fn pending_alarm(&self) -> Option<TimeoutHandle> {
        self.pending_alarm.get().map(|(h, _)| h)
    }

    /// Move time forward to `target_us`, dispatching everything due on the
    /// way in chronological order.  Alarms win ties against edges.
    pub fn advance_to(&self, target_us: u64) {
        loop {
            let next_edge = self
                .edges
                .borrow()
                .iter()
                .enumerate()
                .min_by_key(|(_, (t, _))| *t)
                .map(|(i, (t, l))| (i, *t, *l));
            let alarm = self.pending_alarm.get();

            let alarm_due = alarm.filter(|(_, at)| *at <= target_us);
            let edge_due = next_edge.filter(|(_, at, _)| *at <= target_us);

            match (alarm_due, edge_due) {
                (Some((handle, at)), edge) if edge.is_none_or(|(_, t, _)| at <= t) => {
                    self.now_us.set(self.now_us.get().max(at));
                    self.pending_alarm.set(None);
                    self.fires.set(self.fires.get() + 1);
                    on_timeout_fired(&self.cell, handle);
                }
                (_, Some((idx, at, level))) => {
                    self.edges.borrow_mut().remove(idx);
                    self.now_us.set(self.now_us.get().max(at));
                    self.edge(level);
                }
                _ => break,
            }
        }
        self.now_us.set(self.now_us.get().max(target_us));
    }

    pub fn advance(&self, dt_us: u64) {
        self.advance_to(self.now_us.get() + dt_us);
    }
}

impl MonotonicClock for SimBench {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}

impl TimeoutAlarm for SimBench {
    fn arm(&self, delay_us: u32) -> Option<TimeoutHandle> {
        self.next_handle.set(self.next_handle.get() + 1);
        let handle = TimeoutHandle::new(self.next_handle.get())?;
        self.pending_alarm
            .set(Some((handle, self.now_us.get() + u64::from(delay_us))));
        self.arms.set(self.arms.get() + 1);
        Some(handle)
    }

    fn cancel(&self, handle: TimeoutHandle) {
        self.cancels.set(self.cancels.get() + 1);
        if self.lossy_cancel.get() {
            return;
        }
        if self.pending_alarm() == Some(handle) {
            self.pending_alarm.set(None);
        }
    }
}

/// Trigger line: schedules the echo edges the configured response implies.
pub struct SimTrigger<'a>(pub &'a SimBench);

impl TriggerPort for SimTrigger<'_> {
    fn pulse(&mut self) -> Result<(), TriggerError> {
        let bench = self.0;
        bench.pulses.set(bench.pulses.get() + 1);
        let now = bench.now_us();
        match bench.response.get() {
            EchoResponse::Echo { delay_us, width_us } => {
                bench.schedule_edge(now + delay_us, EchoLevel::High);
                bench.schedule_edge(now + delay_us + width_us, EchoLevel::Low);
            }
            EchoResponse::StuckHigh { delay_us } => {
                bench.schedule_edge(now + delay_us, EchoLevel::High);
            }
            EchoResponse::Silent => {}
        }
        Ok(())
    }
}

/// Delay that advances bench time instead of sleeping.
pub struct SimDelay<'a>(pub &'a SimBench);

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(u64::from(ns) / 1000);
    }
}

/// Records every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<RangingEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &RangingEvent) {
        self.events.push(*event);
    }
}
