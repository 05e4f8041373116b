//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one line per measurement to the
//! ESP-IDF logger (UART / USB-CDC in production).  Lines are formatted
//! into a fixed-capacity buffer first so the same text can be mirrored to
//! a display or radio without allocating.

use core::fmt::Write;

use heapless::String;
use log::{info, warn};

use crate::app::events::RangingEvent;
use crate::app::ports::EventSink;

/// Longest line `format_line` produces ("4294967295 cm").
pub const LINE_CAP: usize = 32;

/// Render the user-facing line for an event.
pub fn format_line(event: &RangingEvent) -> String<LINE_CAP> {
    let mut line = String::new();
    // Capacity covers every variant; a write error can only truncate.
    let _ = match event {
        RangingEvent::Distance(r) => write!(line, "{} cm", r.distance_cm),
        RangingEvent::SensorFailure => write!(line, "sensor failure"),
        RangingEvent::Started { timeout_us } => write!(line, "ready (timeout {} us)", timeout_us),
    };
    line
}

/// Adapter that logs every [`RangingEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    last: String<LINE_CAP>,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently emitted line.
    pub fn last_line(&self) -> &str {
        &self.last
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &RangingEvent) {
        self.last = format_line(event);
        match event {
            RangingEvent::Distance(r) => {
                info!("{} | width={}us", self.last, r.width.as_micros());
            }
            RangingEvent::SensorFailure => warn!("{}", self.last),
            RangingEvent::Started { .. } => info!("{}", self.last),
        }
    }
}
