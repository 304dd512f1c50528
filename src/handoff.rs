//! Hand-over point between the telemetry and connectivity tasks.
//!
//! The telemetry task owns the sensor and the display; the connectivity task
//! owns the WiFi link and the broker session. Readings cross over through a
//! latest-value slot and the broker state comes back as a flag, so neither
//! task ever touches the other's resources.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::model::Reading;

pub struct Handoff {
    pending: Signal<CriticalSectionRawMutex, Reading>,
    broker_up: AtomicBool,
}

impl Handoff {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
            broker_up: AtomicBool::new(false),
        }
    }

    /// Written by the connectivity task whenever its session state changes.
    pub fn set_broker_up(&self, up: bool) {
        self.broker_up.store(up, Ordering::Release);
    }

    pub fn broker_up(&self) -> bool {
        self.broker_up.load(Ordering::Acquire)
    }

    /// Offer a reading for publication. An unpublished older reading is
    /// replaced.
    pub fn offer(&self, reading: Reading) {
        self.pending.signal(reading);
    }

    /// Take the pending reading, if any.
    pub fn take(&self) -> Option<Reading> {
        self.pending.try_take()
    }

    /// Drop whatever is pending. Used when the session goes away so a stale
    /// reading is not sent after reconnecting.
    pub fn discard(&self) {
        self.pending.reset();
    }
}

impl Default for Handoff {
    fn default() -> Self {
        Self::new()
    }
}
