//! Scheduler-level tests of the rendezvous protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;

use pixelart_core::config::SchedulerConfig;
use pixelart_core::types::Payload;
use pixelart_pipeline::{Scheduler, SchedulerState, Stage, StageError, TraceOp};

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        poll_interval_ms: 1,
        channel_timeout_ms: 30,
        channel_capacity: 16,
    }
}

fn jitter(max_ms: u64) {
    let ms = rand::thread_rng().gen_range(0..=max_ms);
    std::thread::sleep(Duration::from_millis(ms));
}

/// A display stage that renders until its cognitive partner reports done,
/// and flags any early exit that was not caused by shutdown.
fn waiting_display(name: &str, state: &Arc<SchedulerState>, early_exit: &Arc<AtomicBool>) -> Stage {
    let state = Arc::clone(state);
    let early_exit = Arc::clone(early_exit);
    Stage::new(name, move |_| {
        jitter(2);
        while !state.display_should_stop() {
            let _ = state.try_receive();
            std::thread::sleep(Duration::from_millis(1));
        }
        if !state.cognitive_done.is_set() && !state.is_shutdown() {
            early_exit.store(true, Ordering::SeqCst);
        }
        Ok(None)
    })
}

#[test]
fn test_signal_ordering_holds_under_random_delays() {
    let state = Arc::new(SchedulerState::with_trace(&fast_config()));
    let early_exit = Arc::new(AtomicBool::new(false));

    let display = vec![
        waiting_display("show.Show.first", &state, &early_exit),
        waiting_display("show.Show.second", &state, &early_exit),
    ];

    let publisher = Arc::clone(&state);
    let cognitive = vec![
        Stage::new("think.Think.listen", |_| {
            jitter(3);
            Ok(Some(Payload::text("hello")))
        }),
        Stage::new("think.Think.flaky", |input| {
            jitter(3);
            if rand::thread_rng().gen_bool(0.2) {
                return Err(StageError::failed("random failure"));
            }
            Ok(input)
        }),
        Stage::new("think.Think.publish", move |input| {
            jitter(3);
            if let Some(payload) = input {
                publisher.publish(payload)?;
            }
            Ok(None)
        }),
    ];

    let summary = Scheduler::new(Arc::clone(&state), display, cognitive)
        .with_display_iterations(40)
        .run()
        .unwrap();

    assert_eq!(summary.display.iterations, 40);
    assert!(!early_exit.load(Ordering::SeqCst), "display stage exited before done");

    let trace = state.trace().expect("trace enabled");

    // display_ready is never consumed twice without an intervening set.
    let mut armed = false;
    for op in trace.ops_for("display_ready") {
        match op {
            TraceOp::Set => armed = true,
            TraceOp::Consume => {
                assert!(armed, "display_ready consumed twice without a set");
                armed = false;
            }
            _ => {}
        }
    }

    // cognitive_done is never set twice without an intervening clear.
    let mut done = false;
    for op in trace.ops_for("cognitive_done") {
        match op {
            TraceOp::Set => {
                assert!(!done, "cognitive_done set twice without a clear");
                done = true;
            }
            TraceOp::Clear => done = false,
            _ => {}
        }
    }
}

#[test]
fn test_chain_threads_results_and_resets_each_iteration() {
    let state = Arc::new(SchedulerState::new(&fast_config()));
    let seen: Arc<Mutex<Vec<(String, Option<Payload>)>>> = Arc::new(Mutex::new(Vec::new()));

    let display_state = Arc::clone(&state);
    let display = vec![Stage::new("show.Show.wait", move |_| {
        display_state.wait_cognitive_done()?;
        Ok(None)
    })];

    let record = |name: &'static str, output: Option<Payload>| {
        let seen = Arc::clone(&seen);
        Stage::new(format!("think.Think.{name}"), move |input| {
            seen.lock().push((name.to_string(), input));
            Ok(output.clone())
        })
    };
    let cognitive = vec![
        record("first", Some(Payload::text("a"))),
        record("second", Some(Payload::text(""))),
        record("third", Some(Payload::text("leftover"))),
    ];

    Scheduler::new(state, display, cognitive)
        .with_display_iterations(6)
        .run()
        .unwrap();

    let seen = seen.lock().clone();
    assert_eq!(
        seen,
        vec![
            ("first".to_string(), None),
            ("second".to_string(), Some(Payload::text("a"))),
            ("third".to_string(), None),
            ("first".to_string(), None),
            ("second".to_string(), Some(Payload::text("a"))),
            ("third".to_string(), None),
        ]
    );
}

#[test]
fn test_cognitive_failure_aborts_iteration_and_releases_display() {
    let state = Arc::new(SchedulerState::new(&fast_config()));
    let third_ran = Arc::new(AtomicBool::new(false));

    let display_state = Arc::clone(&state);
    let display = vec![Stage::new("show.Show.wait", move |_| {
        display_state.wait_cognitive_done()?;
        Ok(None)
    })];

    let flag = Arc::clone(&third_ran);
    let cognitive = vec![
        Stage::new("think.Think.ok", |_| Ok(Some(Payload::text("x")))),
        Stage::new("think.Think.fail", |_| Err(StageError::failed("model crashed"))),
        Stage::new("think.Think.after", move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(None)
        }),
    ];

    let summary = Scheduler::new(state, display, cognitive)
        .with_display_iterations(4)
        .run()
        .unwrap();

    assert!(!third_ran.load(Ordering::SeqCst));
    assert_eq!(summary.cognitive.failures, 2);
}

#[test]
fn test_external_shutdown_unblocks_both_threads() {
    let state = Arc::new(SchedulerState::new(&fast_config()));

    let display_state = Arc::clone(&state);
    let display = vec![Stage::new("show.Show.wait", move |_| {
        display_state.wait_cognitive_done()?;
        Ok(None)
    })];
    let think_state = Arc::clone(&state);
    let cognitive = vec![Stage::new("think.Think.slow", move |_| {
        think_state.pause(Duration::from_secs(30))?;
        Ok(None)
    })];

    let handle = Scheduler::new(state, display, cognitive).start().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    assert!(!handle.is_finished());

    let started = std::time::Instant::now();
    handle.shutdown();
    let summary = handle.join().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.display.failures, 0);
    assert_eq!(summary.cognitive.failures, 0);
}

#[test]
fn test_cognitive_panic_stops_display() {
    let state = Arc::new(SchedulerState::new(&fast_config()));

    let display_state = Arc::clone(&state);
    let display = vec![Stage::new("show.Show.wait", move |_| {
        display_state.wait_cognitive_done()?;
        Ok(None)
    })];
    let cognitive = vec![Stage::new("think.Think.panic", |_| panic!("cognitive exploded"))];

    let err = Scheduler::new(state, display, cognitive).run().unwrap_err();
    assert_eq!(err.kind, pixelart_core::ErrorKind::Internal);
}
