//! The wall-clock seam.
//!
//! Paper removal re-reads the clock between rename attempts, and the
//! console's autodate pattern matcher reads localtime. Both need a seam for
//! deterministic testing without mocking `chrono` itself — the same kind of
//! self-contained clock state the teacher crate's `Timer` device keeps
//! (`devices.rs`, `now: Instant`) rather than calling a bare global.

use chrono::{DateTime, Local};

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
