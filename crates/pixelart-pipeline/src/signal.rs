//! Rendezvous primitives.
//!
//! A [`Signal`] is a boolean guarded by a mutex with a condition variable,
//! so a waiter sleeps until it is set instead of spinning. Every wait is
//! bounded by the poll interval and re-checks the [`ShutdownFlag`], which
//! is what keeps teardown latency bounded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::trace::{SignalTrace, TraceOp};

/// Monotonic cancellation flag. Once set it is never cleared.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    flag: AtomicBool,
}

impl ShutdownFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns `true` if this call was the one that set it.
    pub fn trigger(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Whether shutdown has been requested.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A settable, clearable, waitable boolean.
#[derive(Debug)]
pub struct Signal {
    name: &'static str,
    state: Mutex<bool>,
    cond: Condvar,
    trace: Option<SignalTrace>,
}

impl Signal {
    /// Creates an unset signal.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(false),
            cond: Condvar::new(),
            trace: None,
        }
    }

    /// Creates an unset signal that records every operation.
    pub fn traced(name: &'static str, trace: SignalTrace) -> Self {
        Self {
            trace: Some(trace),
            ..Self::new(name)
        }
    }

    /// Signal name as used in logs and traces.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sets the signal and wakes all waiters.
    pub fn set(&self) {
        let mut set = self.state.lock();
        *set = true;
        self.record(TraceOp::Set);
        self.cond.notify_all();
    }

    /// Clears the signal.
    pub fn clear(&self) {
        let mut set = self.state.lock();
        *set = false;
        self.record(TraceOp::Clear);
    }

    /// Current value.
    pub fn is_set(&self) -> bool {
        *self.state.lock()
    }

    /// Wakes waiters without changing the value, so they re-check shutdown.
    pub fn notify(&self) {
        let _guard = self.state.lock();
        self.cond.notify_all();
    }

    /// Blocks until the signal is set, then clears it in the same critical
    /// section.
    ///
    /// Returns `false` without consuming if `shutdown` is observed first.
    pub fn wait_and_clear(&self, shutdown: &ShutdownFlag, poll: Duration) -> bool {
        let mut set = self.state.lock();
        loop {
            if *set {
                *set = false;
                self.record(TraceOp::Consume);
                return true;
            }
            if shutdown.is_set() {
                return false;
            }
            self.cond.wait_for(&mut set, poll);
        }
    }

    /// Blocks until the signal is set, leaving it set.
    ///
    /// Returns `false` if `shutdown` is observed first.
    pub fn wait_set(&self, shutdown: &ShutdownFlag, poll: Duration) -> bool {
        let mut set = self.state.lock();
        loop {
            if *set {
                return true;
            }
            if shutdown.is_set() {
                return false;
            }
            self.cond.wait_for(&mut set, poll);
        }
    }

    fn record(&self, op: TraceOp) {
        if let Some(trace) = &self.trace {
            trace.record(self.name, op);
        }
    }
}
