//! # pixelart-pipeline
//!
//! Runs the display and cognitive chains as two OS threads and keeps them
//! interleaved:
//!
//! - [`Signal`] pair (`display_ready`, `cognitive_done`) answers "whose turn is it"
//! - [`ResultChannel`] answers "what to render"
//! - [`ShutdownFlag`] is the only cancellation mechanism and is monotonic
//! - [`rendezvous`] wraps every stage with the enter/exit handshake
//! - [`Scheduler`] owns both loops and joins them

pub mod channel;
pub mod error;
pub mod rendezvous;
pub mod scheduler;
pub mod signal;
pub mod stage;
pub mod state;
pub mod trace;

pub use channel::ResultChannel;
pub use error::{StageError, StageResult};
pub use scheduler::{LoopStats, RunSummary, Scheduler, SchedulerHandle};
pub use signal::{ShutdownFlag, Signal};
pub use stage::{Stage, StageFn};
pub use state::SchedulerState;
pub use trace::{SignalTrace, TraceEvent, TraceOp};
