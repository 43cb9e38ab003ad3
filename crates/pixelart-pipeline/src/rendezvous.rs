//! Enter/exit handshake around every stage.
//!
//! A display stage announces itself, runs its effect until the paired
//! cognitive stage reports completion, then re-arms. A cognitive stage
//! waits for the announcement, does its work, and reports completion.
//!
//! ```text
//!  display:   set(ready) ── body ─────────────────────── clear(done)
//!  cognitive:          consume(ready) ── body ── set(done)
//! ```

use pixelart_core::types::Payload;

use crate::error::{StageError, StageResult};
use crate::stage::Stage;
use crate::state::SchedulerState;

/// Runs one display stage inside the display side of the handshake.
///
/// `cognitive_done` is cleared on exit whether or not the body succeeded,
/// so a failing display stage never leaves the next one seeing a stale
/// completion.
pub fn run_display_stage(state: &SchedulerState, stage: &Stage) -> StageResult<()> {
    state.display_ready.set();
    let outcome = stage.invoke(None);
    state.cognitive_done.clear();
    outcome.map(|_| ())
}

/// Runs one cognitive stage inside the cognitive side of the handshake.
///
/// Fails with [`StageError::Terminated`] if shutdown is observed before
/// the wait, during the wait, or after the body. A failing body still sets
/// `cognitive_done` so the display side is released.
pub fn run_cognitive_stage(
    state: &SchedulerState,
    stage: &Stage,
    input: Option<Payload>,
) -> StageResult<Option<Payload>> {
    if state.is_shutdown() {
        return Err(StageError::Terminated);
    }
    if !state
        .display_ready
        .wait_and_clear(&state.shutdown, state.poll_interval())
    {
        return Err(StageError::Terminated);
    }

    match stage.invoke(input) {
        Ok(output) => {
            if state.is_shutdown() {
                return Err(StageError::Terminated);
            }
            state.cognitive_done.set();
            Ok(output)
        }
        Err(StageError::Terminated) => Err(StageError::Terminated),
        Err(err) => {
            if !state.is_shutdown() {
                state.cognitive_done.set();
            }
            Err(err)
        }
    }
}
