//! Shared scheduler state handed to the engine and to every plugin.

use std::time::Duration;

use pixelart_core::config::SchedulerConfig;
use pixelart_core::types::Payload;

use crate::channel::ResultChannel;
use crate::error::{StageError, StageResult};
use crate::signal::{ShutdownFlag, Signal};
use crate::trace::SignalTrace;

/// Signals, shutdown flag and result channel for one engine run.
#[derive(Debug)]
pub struct SchedulerState {
    /// Set by a display stage on entry; consumed by the next cognitive stage.
    pub display_ready: Signal,
    /// Set by a cognitive stage on exit; cleared by the display stage on exit.
    pub cognitive_done: Signal,
    /// Monotonic, process-wide cancellation.
    pub shutdown: ShutdownFlag,
    /// Cognitive-to-display payload queue.
    pub channel: ResultChannel,
    poll_interval: Duration,
    channel_timeout: Duration,
    trace: Option<SignalTrace>,
}

impl SchedulerState {
    /// Creates fresh state: both signals clear, shutdown unset, channel empty.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            display_ready: Signal::new("display_ready"),
            cognitive_done: Signal::new("cognitive_done"),
            shutdown: ShutdownFlag::new(),
            channel: ResultChannel::bounded(config.channel_capacity),
            poll_interval: config.poll_interval(),
            channel_timeout: config.channel_timeout(),
            trace: None,
        }
    }

    /// Creates fresh state whose signals and channel record into a trace.
    pub fn with_trace(config: &SchedulerConfig) -> Self {
        let trace = SignalTrace::new();
        Self {
            display_ready: Signal::traced("display_ready", trace.clone()),
            cognitive_done: Signal::traced("cognitive_done", trace.clone()),
            channel: ResultChannel::bounded(config.channel_capacity).with_trace(trace.clone()),
            trace: Some(trace),
            ..Self::new(config)
        }
    }

    /// The trace, if enabled.
    pub fn trace(&self) -> Option<&SignalTrace> {
        self.trace.as_ref()
    }

    /// Interval between shutdown checks inside any wait.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Default time a display consumer waits on the channel.
    pub fn channel_timeout(&self) -> Duration {
        self.channel_timeout
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_set()
    }

    /// Sets the shutdown flag and wakes every waiter.
    pub fn request_shutdown(&self) {
        if self.shutdown.trigger() {
            tracing::info!("Shutdown requested");
        }
        self.display_ready.notify();
        self.cognitive_done.notify();
    }

    /// Whether a display stage should stop its effect: its paired cognitive
    /// stage finished, or the engine is going down.
    pub fn display_should_stop(&self) -> bool {
        self.cognitive_done.is_set() || self.is_shutdown()
    }

    /// Blocks a display stage until its paired cognitive stage finishes.
    ///
    /// Returns [`StageError::Terminated`] on shutdown.
    pub fn wait_cognitive_done(&self) -> StageResult<()> {
        if self.cognitive_done.wait_set(&self.shutdown, self.poll_interval) {
            Ok(())
        } else {
            Err(StageError::Terminated)
        }
    }

    /// Sleeps for `duration` in poll-sized slices.
    ///
    /// Returns [`StageError::Terminated`] as soon as shutdown is observed.
    pub fn pause(&self, duration: Duration) -> StageResult<()> {
        let deadline = std::time::Instant::now() + duration;
        loop {
            if self.is_shutdown() {
                return Err(StageError::Terminated);
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            std::thread::sleep(remaining.min(self.poll_interval));
        }
    }

    /// Publishes a payload for the display side, blocking while the channel is full.
    pub fn publish(&self, payload: Payload) -> StageResult<()> {
        self.channel.send(payload, &self.shutdown, self.poll_interval)
    }

    /// Waits up to the channel timeout for a payload.
    pub fn receive(&self) -> Option<Payload> {
        self.channel
            .recv_until(self.channel_timeout, &self.shutdown, self.poll_interval)
    }

    /// Takes a payload if one is already buffered.
    pub fn try_receive(&self) -> Option<Payload> {
        self.channel.try_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            poll_interval_ms: 2,
            channel_timeout_ms: 20,
            channel_capacity: 4,
        }
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = SchedulerState::new(&fast_config());
        assert!(!state.display_ready.is_set());
        assert!(!state.cognitive_done.is_set());
        assert!(!state.is_shutdown());
        assert!(state.channel.is_empty());
        assert!(state.trace().is_none());
    }

    #[test]
    fn test_pause_interrupted_by_shutdown() {
        let state = SchedulerState::new(&fast_config());
        state.request_shutdown();
        assert_eq!(
            state.pause(Duration::from_secs(10)),
            Err(StageError::Terminated)
        );
    }

    #[test]
    fn test_wait_cognitive_done_terminates_on_shutdown() {
        let state = SchedulerState::new(&fast_config());
        state.request_shutdown();
        assert_eq!(state.wait_cognitive_done(), Err(StageError::Terminated));
        assert!(state.display_should_stop());
    }

    #[test]
    fn test_publish_receive_round_trip() {
        let state = SchedulerState::with_trace(&fast_config());
        state.publish(Payload::path("/tmp/a.png")).unwrap();
        assert_eq!(state.receive(), Some(Payload::path("/tmp/a.png")));
        assert!(state.receive().is_none());

        let trace = state.trace().expect("trace enabled");
        assert_eq!(
            trace.ops_for("channel"),
            vec![crate::trace::TraceOp::Send, crate::trace::TraceOp::Receive]
        );
    }
}
