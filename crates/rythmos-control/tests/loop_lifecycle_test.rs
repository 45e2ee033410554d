// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lifecycle integration tests: construction, start/stop semantics, the done
//! signal, and terminal-error retrieval.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use rythmos_control::{GameLoop, LifecyclePhase, LoopError, HZ60_STEP};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn instant_ok() -> impl FnMut(Duration) -> anyhow::Result<()> + Send + 'static {
    |_| Ok(())
}

const DONE_TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn construction_succeeds_with_valid_periods() {
    init_logger();
    let game_loop = GameLoop::new(instant_ok(), instant_ok(), HZ60_STEP, HZ60_STEP)
        .expect("60 Hz periods are valid");
    assert_eq!(game_loop.phase(), LifecyclePhase::Idle);
}

#[test]
fn construction_rejects_a_zero_period() {
    init_logger();
    let err = GameLoop::new(instant_ok(), instant_ok(), Duration::ZERO, HZ60_STEP)
        .err()
        .expect("zero render period must fail");
    assert!(matches!(err, LoopError::Config { .. }), "got {err}");

    let err = GameLoop::new(instant_ok(), instant_ok(), HZ60_STEP, Duration::ZERO)
        .err()
        .expect("zero simulation period must fail");
    assert!(matches!(err, LoopError::Config { .. }), "got {err}");
}

#[test]
fn start_then_stop_ends_cleanly() {
    init_logger();
    let game_loop = GameLoop::new(instant_ok(), instant_ok(), HZ60_STEP, HZ60_STEP)
        .expect("valid periods");

    game_loop.start().expect("first start must succeed");
    assert_eq!(game_loop.phase(), LifecyclePhase::Running);

    game_loop.stop(None);
    assert!(
        game_loop.done().wait_timeout(DONE_TIMEOUT),
        "done must fire after stop"
    );
    assert!(game_loop.err().is_none(), "clean stop has no terminal error");
    assert_eq!(game_loop.phase(), LifecyclePhase::Stopped);
}

#[test]
fn stop_before_start_prevents_starting() {
    init_logger();
    let game_loop = GameLoop::new(instant_ok(), instant_ok(), HZ60_STEP, HZ60_STEP)
        .expect("valid periods");

    game_loop.stop(None);
    assert!(
        game_loop.done().wait_timeout(DONE_TIMEOUT),
        "done must fire for a never-started loop"
    );

    let err = game_loop.start().err().expect("start after stop must fail");
    assert!(
        matches!(
            err,
            LoopError::Lifecycle {
                phase: LifecyclePhase::Stopped
            }
        ),
        "got {err}"
    );
    assert!(game_loop.err().is_none());

    // The telemetry channels close along with the loop.
    assert!(matches!(
        game_loop.heartbeat().recv_timeout(Duration::from_secs(1)),
        Err(flume::RecvTimeoutError::Disconnected)
    ));
}

#[test]
fn first_stop_cause_wins() {
    init_logger();
    let game_loop = GameLoop::new(instant_ok(), instant_ok(), HZ60_STEP, HZ60_STEP)
        .expect("valid periods");
    game_loop.start().expect("start must succeed");

    game_loop.stop(Some(LoopError::Aborted(anyhow!("first"))));
    game_loop.stop(Some(LoopError::Aborted(anyhow!("second"))));

    assert!(game_loop.done().wait_timeout(DONE_TIMEOUT));
    let err = game_loop.err().expect("a cause was recorded");
    assert!(
        matches!(&*err, LoopError::Aborted(cause) if cause.to_string() == "first"),
        "got {err}"
    );

    // Stopping after done is a no-op as well.
    game_loop.stop(Some(LoopError::Aborted(anyhow!("third"))));
    assert_eq!(game_loop.err().expect("still set").to_string(), "first");
}

#[test]
fn double_start_is_rejected_without_disturbing_the_loop() {
    init_logger();
    let simulate_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&simulate_calls);

    let game_loop = GameLoop::new(
        instant_ok(),
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(5),
        Duration::from_millis(5),
    )
    .expect("valid periods");

    game_loop.start().expect("first start must succeed");
    thread::sleep(Duration::from_millis(40));
    let before_second_start = simulate_calls.load(Ordering::SeqCst);
    assert!(before_second_start > 0, "the loop should be ticking");

    let err = game_loop.start().err().expect("second start must fail");
    assert!(
        matches!(
            err,
            LoopError::Lifecycle {
                phase: LifecyclePhase::Running
            }
        ),
        "got {err}"
    );

    // The rejected start must not have reset or restarted anything.
    thread::sleep(Duration::from_millis(40));
    assert!(simulate_calls.load(Ordering::SeqCst) >= before_second_start);

    game_loop.stop(None);
    assert!(game_loop.done().wait_timeout(DONE_TIMEOUT));
}

#[test]
fn dropping_the_loop_stops_the_runner() {
    init_logger();
    let simulate_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&simulate_calls);

    let game_loop = GameLoop::new(
        instant_ok(),
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(5),
        Duration::from_millis(5),
    )
    .expect("valid periods");
    game_loop.start().expect("start must succeed");
    thread::sleep(Duration::from_millis(30));

    drop(game_loop);

    let after_drop = simulate_calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(
        simulate_calls.load(Ordering::SeqCst),
        after_drop,
        "no invocation may happen after drop has joined the runner"
    );
}

#[test]
fn a_handle_stops_the_loop_from_another_thread() {
    init_logger();
    let game_loop = GameLoop::new(instant_ok(), instant_ok(), HZ60_STEP, HZ60_STEP)
        .expect("valid periods");
    game_loop.start().expect("start must succeed");

    let handle = game_loop.handle();
    let stopper = thread::spawn(move || {
        handle.stop(Some(LoopError::Aborted(anyhow!("window closed"))));
        handle.done().wait_timeout(DONE_TIMEOUT)
    });

    assert!(stopper.join().expect("stopper thread panicked"));
    let err = game_loop.err().expect("cause recorded through the handle");
    assert!(
        matches!(&*err, LoopError::Aborted(cause) if cause.to_string() == "window closed"),
        "got {err}"
    );
    assert_eq!(game_loop.phase(), LifecyclePhase::Stopped);
}
