//! Dual-pipeline scheduler.
//!
//! Runs the display chain and the cognitive chain as two named OS threads
//! over one shared [`SchedulerState`]. Each thread loops over its chain
//! until shutdown; when either loop exits for any reason, including a
//! panic, shutdown is set so the other side unblocks.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pixelart_core::{AppError, AppResult};
use pixelart_core::types::Payload;

use crate::error::StageError;
use crate::rendezvous::{run_cognitive_stage, run_display_stage};
use crate::stage::Stage;
use crate::state::SchedulerState;

/// Per-loop counters reported after the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    /// Outer iterations started.
    pub iterations: u64,
    /// Iterations abandoned because a stage failed.
    pub failures: u64,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Display loop counters.
    pub display: LoopStats,
    /// Cognitive loop counters.
    pub cognitive: LoopStats,
    /// When the threads were started.
    pub started_at: DateTime<Utc>,
    /// When both threads had been joined.
    pub finished_at: DateTime<Utc>,
}

/// Sets shutdown when the owning loop exits, including by unwinding.
struct ShutdownOnExit<'a>(&'a SchedulerState);

impl Drop for ShutdownOnExit<'_> {
    fn drop(&mut self) {
        self.0.request_shutdown();
    }
}

/// Builder for one engine run.
#[derive(Debug)]
pub struct Scheduler {
    state: Arc<SchedulerState>,
    display: Vec<Stage>,
    cognitive: Vec<Stage>,
    max_display_iterations: Option<u64>,
}

impl Scheduler {
    /// Creates a scheduler over the given state and chains.
    pub fn new(state: Arc<SchedulerState>, display: Vec<Stage>, cognitive: Vec<Stage>) -> Self {
        Self {
            state,
            display,
            cognitive,
            max_display_iterations: None,
        }
    }

    /// Stops the run after the display loop completes `iterations` outer
    /// iterations. Unlimited by default.
    pub fn with_display_iterations(mut self, iterations: u64) -> Self {
        self.max_display_iterations = Some(iterations);
        self
    }

    /// Shared state of this run.
    pub fn state(&self) -> &Arc<SchedulerState> {
        &self.state
    }

    /// Spawns both pipeline threads and returns immediately.
    pub fn start(self) -> AppResult<SchedulerHandle> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting scheduler: display={:?}, cognitive={:?}",
            self.display.iter().map(Stage::name).collect::<Vec<_>>(),
            self.cognitive.iter().map(Stage::name).collect::<Vec<_>>()
        );

        let display = {
            let state = Arc::clone(&self.state);
            let stages = self.display;
            let limit = self.max_display_iterations;
            thread::Builder::new()
                .name("display-pipeline".to_string())
                .spawn(move || display_loop(&state, &stages, limit))
                .map_err(|e| {
                    AppError::with_source(
                        pixelart_core::ErrorKind::Internal,
                        "Failed to spawn display pipeline thread",
                        e,
                    )
                })?
        };

        let cognitive = {
            let state = Arc::clone(&self.state);
            let stages = self.cognitive;
            thread::Builder::new()
                .name("cognitive-pipeline".to_string())
                .spawn(move || cognitive_loop(&state, &stages))
        };

        let cognitive = match cognitive {
            Ok(handle) => handle,
            Err(e) => {
                self.state.request_shutdown();
                let _ = display.join();
                return Err(AppError::with_source(
                    pixelart_core::ErrorKind::Internal,
                    "Failed to spawn cognitive pipeline thread",
                    e,
                ));
            }
        };

        Ok(SchedulerHandle {
            state: self.state,
            display,
            cognitive,
            started_at,
        })
    }

    /// Spawns both threads and blocks until they finish.
    pub fn run(self) -> AppResult<RunSummary> {
        self.start()?.join()
    }
}

/// Handle to a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    state: Arc<SchedulerState>,
    display: JoinHandle<LoopStats>,
    cognitive: JoinHandle<LoopStats>,
    started_at: DateTime<Utc>,
}

impl SchedulerHandle {
    /// Shared state of this run.
    pub fn state(&self) -> &Arc<SchedulerState> {
        &self.state
    }

    /// Requests shutdown; threads exit within roughly one poll interval
    /// plus the remaining time of any stage body in progress.
    pub fn shutdown(&self) {
        self.state.request_shutdown();
    }

    /// Whether both threads have exited.
    pub fn is_finished(&self) -> bool {
        self.display.is_finished() && self.cognitive.is_finished()
    }

    /// Waits for the display loop, then the cognitive loop.
    ///
    /// A panic in either thread is reported as an internal error after both
    /// have been joined.
    pub fn join(self) -> AppResult<RunSummary> {
        let display = self.display.join();
        // The display loop's guard has already set shutdown; repeat in case
        // the thread died before installing it.
        self.state.request_shutdown();
        let cognitive = self.cognitive.join();

        let display = display
            .map_err(|_| AppError::internal("Display pipeline thread panicked"))?;
        let cognitive = cognitive
            .map_err(|_| AppError::internal("Cognitive pipeline thread panicked"))?;

        let summary = RunSummary {
            display,
            cognitive,
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            "Scheduler stopped: display_iterations={}, display_failures={}, cognitive_iterations={}, cognitive_failures={}",
            summary.display.iterations,
            summary.display.failures,
            summary.cognitive.iterations,
            summary.cognitive.failures
        );
        Ok(summary)
    }
}

fn display_loop(state: &SchedulerState, stages: &[Stage], limit: Option<u64>) -> LoopStats {
    let _guard = ShutdownOnExit(state);
    let _span = tracing::info_span!("pipeline", kind = "display").entered();
    let mut stats = LoopStats::default();

    if stages.is_empty() {
        tracing::warn!("Display pipeline is empty; idling until shutdown");
    }

    'outer: loop {
        if state.is_shutdown() {
            break;
        }
        if limit.is_some_and(|max| stats.iterations >= max) {
            tracing::info!("Display pipeline reached {} iterations", stats.iterations);
            break;
        }
        if stages.is_empty() {
            thread::sleep(state.poll_interval());
            continue;
        }

        stats.iterations += 1;
        for stage in stages {
            if state.is_shutdown() {
                break 'outer;
            }
            tracing::debug!(stage = stage.name(), "Display stage entering");
            match run_display_stage(state, stage) {
                Ok(()) => {}
                Err(StageError::Terminated) => break 'outer,
                Err(StageError::Failed(message)) => {
                    tracing::error!(stage = stage.name(), "Display stage failed: {}", message);
                    stats.failures += 1;
                    continue 'outer;
                }
            }
        }
    }

    tracing::info!("Display pipeline exiting");
    stats
}

fn cognitive_loop(state: &SchedulerState, stages: &[Stage]) -> LoopStats {
    let _guard = ShutdownOnExit(state);
    let _span = tracing::info_span!("pipeline", kind = "cognitive").entered();
    let mut stats = LoopStats::default();

    if stages.is_empty() {
        tracing::warn!("Cognitive pipeline is empty; idling until shutdown");
    }

    'outer: loop {
        if state.is_shutdown() {
            break;
        }
        if stages.is_empty() {
            thread::sleep(state.poll_interval());
            continue;
        }

        stats.iterations += 1;
        let mut carried: Option<Payload> = None;
        for stage in stages {
            let input = carried.take().filter(|p| !p.is_empty());
            tracing::debug!(
                stage = stage.name(),
                input = input.as_ref().map(Payload::kind),
                "Cognitive stage entering"
            );
            match run_cognitive_stage(state, stage, input) {
                Ok(output) => carried = output,
                Err(StageError::Terminated) => break 'outer,
                Err(StageError::Failed(message)) => {
                    tracing::error!(stage = stage.name(), "Cognitive stage failed: {}", message);
                    stats.failures += 1;
                    continue 'outer;
                }
            }
        }
        if let Some(result) = &carried {
            tracing::debug!(kind = result.kind(), "Cognitive chain produced a final result");
        }
    }

    tracing::info!("Cognitive pipeline exiting");
    stats
}
