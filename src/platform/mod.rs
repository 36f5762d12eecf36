//! Platform abstraction layer
//!
//! Wall-clock time for result timestamps, and (in the browser) the adapter
//! the JavaScript scene talks to.

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, SecondsFormat};

/// Wall-clock source (unix epoch milliseconds)
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Real time: `Date.now()` in the browser, the system clock natively
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and replays. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

/// `2026-01-02T03:04:05.678Z`
pub fn iso_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
