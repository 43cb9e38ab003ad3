//! Bounded FIFO from cognitive stages to display stages.
//!
//! Multiple producers, multiple consumers. Producers block while the
//! channel is full, re-checking shutdown every poll interval; consumers
//! block up to a configurable timeout and get `None` if nothing arrived.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};

use pixelart_core::types::Payload;

use crate::error::{StageError, StageResult};
use crate::signal::ShutdownFlag;
use crate::trace::{SignalTrace, TraceOp};

/// The result channel shared by both pipelines.
#[derive(Debug, Clone)]
pub struct ResultChannel {
    tx: Sender<Payload>,
    rx: Receiver<Payload>,
    capacity: usize,
    trace: Option<SignalTrace>,
}

impl ResultChannel {
    /// Creates a channel holding at most `capacity` payloads.
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            trace: None,
        }
    }

    pub(crate) fn with_trace(mut self, trace: SignalTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Maximum number of buffered payloads.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of payloads currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the channel holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Enqueues a payload, blocking while the channel is full.
    ///
    /// Returns [`StageError::Terminated`] if shutdown is observed while
    /// waiting for space.
    pub fn send(&self, payload: Payload, shutdown: &ShutdownFlag, poll: Duration) -> StageResult<()> {
        let mut pending = payload;
        loop {
            if shutdown.is_set() {
                return Err(StageError::Terminated);
            }
            match self.tx.send_timeout(pending, poll) {
                Ok(()) => {
                    self.record(TraceOp::Send);
                    return Ok(());
                }
                Err(SendTimeoutError::Timeout(back)) => pending = back,
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(StageError::failed("result channel disconnected"));
                }
            }
        }
    }

    /// Enqueues without blocking. Returns the payload back if the channel is full.
    pub fn try_send(&self, payload: Payload) -> Result<(), Payload> {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.record(TraceOp::Send);
                Ok(())
            }
            Err(TrySendError::Full(p) | TrySendError::Disconnected(p)) => Err(p),
        }
    }

    /// Takes the oldest payload if one is buffered.
    pub fn try_recv(&self) -> Option<Payload> {
        let payload = self.rx.try_recv().ok()?;
        self.record(TraceOp::Receive);
        Some(payload)
    }

    /// Waits up to `timeout` for a payload.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Payload> {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => {
                self.record(TraceOp::Receive);
                Some(payload)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for a payload, returning early on shutdown.
    pub fn recv_until(
        &self,
        timeout: Duration,
        shutdown: &ShutdownFlag,
        poll: Duration,
    ) -> Option<Payload> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if shutdown.is_set() {
                return None;
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            if let Some(payload) = self.recv_timeout(remaining.min(poll)) {
                return Some(payload);
            }
        }
    }

    /// Removes and returns every buffered payload, oldest first.
    pub fn drain(&self) -> Vec<Payload> {
        let drained: Vec<Payload> = self.rx.try_iter().collect();
        for _ in &drained {
            self.record(TraceOp::Receive);
        }
        drained
    }

    fn record(&self, op: TraceOp) {
        if let Some(trace) = &self.trace {
            trace.record("channel", op);
        }
    }
}
