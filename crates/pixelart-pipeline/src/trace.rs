//! Optional event log of rendezvous and channel operations.
//!
//! Off by default. Tests enable it through
//! [`SchedulerState::with_trace`](crate::state::SchedulerState::with_trace) and
//! assert ordering properties over the recorded sequence.

use std::sync::Arc;

use parking_lot::Mutex;

/// Operation recorded against a signal or the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    /// Signal set.
    Set,
    /// Signal cleared.
    Clear,
    /// Signal observed set and cleared atomically by a waiter.
    Consume,
    /// Payload placed on the channel.
    Send,
    /// Payload taken off the channel.
    Receive,
}

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// `"display_ready"`, `"cognitive_done"` or `"channel"`.
    pub source: &'static str,
    /// What happened.
    pub op: TraceOp,
}

/// Shared append-only event log.
#[derive(Debug, Clone, Default)]
pub struct SignalTrace {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl SignalTrace {
    /// Creates an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&self, source: &'static str, op: TraceOp) {
        self.events.lock().push(TraceEvent { source, op });
    }

    /// Copy of all recorded events, in order.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Operations recorded for one source, in order.
    pub fn ops_for(&self, source: &str) -> Vec<TraceOp> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.op)
            .collect()
    }
}
