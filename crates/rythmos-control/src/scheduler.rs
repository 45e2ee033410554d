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

//! The tick-driven scheduling loop and its runner thread.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{select, tick};

use rythmos_core::error::{LoopError, StepError, StepOrigin};
use rythmos_core::lifecycle::{DoneLatch, DoneSignal, LifecyclePhase};
use rythmos_core::pacing::Pacing;
use rythmos_core::telemetry::{
    LatencySample, LatencyTracker, LoopPulse, LoopStats, Pulse, StatProfile,
};

use crate::config::LoopConfig;

/// A user-supplied step callback.
///
/// `step` is the amount of time the invocation must account for: always the
/// fixed simulation period for the simulation activity, a whole multiple of
/// the render period for the render activity. Returning an error stops the
/// loop; the error becomes part of its terminal [`StepError`] envelope.
pub type StepFn = Box<dyn FnMut(Duration) -> anyhow::Result<()> + Send + 'static>;

const STAT_WINDOW_SAMPLES: usize = 120;

/// State moved into the runner thread when the loop starts.
struct RunnerParts {
    render: StepFn,
    simulate: StepFn,
    pacing: Pacing,
    heartbeat: Pulse<LatencySample>,
    pulses: Pulse<LoopPulse>,
    stats: Pulse<LoopStats>,
    heartbeat_period: Duration,
}

/// Mutable lifecycle state, guarded by one mutex so concurrent `stop` calls
/// race safely and exactly one wins.
struct CellState {
    phase: LifecyclePhase,
    error: Option<Arc<LoopError>>,
    /// Present while idle; taken by `start` (into the runner) or dropped by a
    /// stop-before-start, which closes the telemetry channels.
    parts: Option<Box<RunnerParts>>,
    /// Present until the runner takes ownership of firing the done signal.
    latch: Option<DoneLatch>,
    /// Dropping this wakes the runner out of its timer wait.
    shutdown_tx: Option<crossbeam_channel::Sender<()>>,
    runner: Option<thread::JoinHandle<()>>,
}

struct Shared {
    cell: Mutex<CellState>,
    done: DoneSignal,
    shutdown_rx: crossbeam_channel::Receiver<()>,
    heartbeat_rx: flume::Receiver<LatencySample>,
    pulse_rx: flume::Receiver<LoopPulse>,
    stats_rx: flume::Receiver<LoopStats>,
}

impl Shared {
    fn start(shared: &Arc<Shared>) -> Result<(), LoopError> {
        let mut cell = shared.cell.lock().unwrap();
        if cell.phase != LifecyclePhase::Idle {
            return Err(LoopError::Lifecycle { phase: cell.phase });
        }

        let parts = cell
            .parts
            .take()
            .expect("an idle loop retains its runner parts");
        let latch = cell
            .latch
            .take()
            .expect("an idle loop retains its done latch");

        debug_assert!(cell.phase.can_advance_to(LifecyclePhase::Running));
        cell.phase = LifecyclePhase::Running;

        let base_tick = parts.pacing.base_period();
        let runner_shared = Arc::clone(shared);
        let shutdown = shared.shutdown_rx.clone();
        cell.runner = Some(thread::spawn(move || {
            run(runner_shared, shutdown, *parts, latch);
        }));

        log::info!("game loop started (base tick {base_tick:?})");
        Ok(())
    }

    fn stop(&self, cause: Option<LoopError>) {
        let mut cell = self.cell.lock().unwrap();
        if cell.phase == LifecyclePhase::Stopped {
            log::trace!("stop ignored, loop already stopped");
            return;
        }

        if let Some(cause) = cause {
            cell.error = Some(Arc::new(cause));
        }

        let was_idle = cell.phase == LifecyclePhase::Idle;
        debug_assert!(cell.phase.can_advance_to(LifecyclePhase::Stopped));
        cell.phase = LifecyclePhase::Stopped;

        // Wake the runner; it fires the done signal once the in-flight
        // callback (if any) has returned.
        cell.shutdown_tx.take();

        if was_idle {
            // No runner exists; close the telemetry channels and fire the
            // done signal here.
            cell.parts.take();
            cell.latch.take();
        }

        log::debug!(
            "game loop stopping ({})",
            match &cell.error {
                Some(error) => error.to_string(),
                None => "clean".to_string(),
            }
        );
    }

    fn err(&self) -> Option<Arc<LoopError>> {
        self.cell.lock().unwrap().error.clone()
    }

    fn phase(&self) -> LifecyclePhase {
        self.cell.lock().unwrap().phase
    }
}

/// A tick-driven scheduling loop pairing a fixed-step simulation activity
/// with an elastic-step render activity.
///
/// The loop is created idle, started at most once, and stopped at most once;
/// a stopped loop cannot be restarted. All timing-sensitive work happens on
/// one background runner thread, so the two callbacks are never invoked
/// concurrently with each other or with themselves.
///
/// `stop` never interrupts an in-flight callback, and a callback that never
/// returns blocks the loop indefinitely. Dropping the loop stops it and joins
/// the runner thread.
pub struct GameLoop {
    shared: Arc<Shared>,
}

impl GameLoop {
    /// Creates an idle loop from the two step callbacks and their periods.
    ///
    /// Fails with [`LoopError::Config`] if either period is zero. No callback
    /// is invoked and no background work is started until
    /// [`start`](GameLoop::start) succeeds.
    pub fn new<R, S>(
        render: R,
        simulate: S,
        render_period: Duration,
        simulation_period: Duration,
    ) -> Result<Self, LoopError>
    where
        R: FnMut(Duration) -> anyhow::Result<()> + Send + 'static,
        S: FnMut(Duration) -> anyhow::Result<()> + Send + 'static,
    {
        Self::with_config(
            render,
            simulate,
            LoopConfig::with_periods(render_period, simulation_period),
        )
    }

    /// Creates an idle loop from a full [`LoopConfig`].
    pub fn with_config<R, S>(render: R, simulate: S, config: LoopConfig) -> Result<Self, LoopError>
    where
        R: FnMut(Duration) -> anyhow::Result<()> + Send + 'static,
        S: FnMut(Duration) -> anyhow::Result<()> + Send + 'static,
    {
        let pacing = Pacing::new(
            config.render_period,
            config.simulation_period,
            config.max_catch_up_steps,
        )?;
        if config.heartbeat_period.is_zero() {
            return Err(LoopError::Config {
                param: "heartbeat period",
                problem: "must be non-zero",
            });
        }

        let heartbeat = Pulse::new();
        let pulses = Pulse::new();
        let stats = Pulse::new();
        let (latch, done) = DoneSignal::new();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let shared = Arc::new(Shared {
            heartbeat_rx: heartbeat.subscribe(),
            pulse_rx: pulses.subscribe(),
            stats_rx: stats.subscribe(),
            done,
            shutdown_rx,
            cell: Mutex::new(CellState {
                phase: LifecyclePhase::Idle,
                error: None,
                parts: Some(Box::new(RunnerParts {
                    render: Box::new(render),
                    simulate: Box::new(simulate),
                    pacing,
                    heartbeat,
                    pulses,
                    stats,
                    heartbeat_period: config.heartbeat_period,
                })),
                latch: Some(latch),
                shutdown_tx: Some(shutdown_tx),
                runner: None,
            }),
        });

        Ok(Self { shared })
    }

    /// Starts the runner thread. Non-blocking.
    ///
    /// Fails with [`LoopError::Lifecycle`] unless the loop is idle; the
    /// existing state is untouched in the failure case.
    pub fn start(&self) -> Result<(), LoopError> {
        Shared::start(&self.shared)
    }

    /// Stops the loop, recording `cause` as its terminal error.
    ///
    /// Thread-safe and callable from anywhere, including from inside the
    /// callbacks via a [`LoopHandle`]. The first call wins; later calls are
    /// silently ignored, so callers may stop unconditionally without checking
    /// state. The done signal fires only after the in-flight callback (if
    /// any) has returned.
    pub fn stop(&self, cause: Option<LoopError>) {
        self.shared.stop(cause);
    }

    /// The one-shot completion signal.
    ///
    /// Once it fires, neither callback will ever be invoked again and any
    /// in-flight invocation has already returned.
    pub fn done(&self) -> DoneSignal {
        self.shared.done.clone()
    }

    /// The terminal error: `None` while the loop runs or after a clean stop.
    pub fn err(&self) -> Option<Arc<LoopError>> {
        self.shared.err()
    }

    /// Snapshot of the current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        self.shared.phase()
    }

    /// A cheap, cloneable control handle for use from other threads or from
    /// inside the step callbacks.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Latency samples at heartbeat cadence. Best-effort: a sample is dropped
    /// whenever no consumer is ready, so this reports a roughly-current
    /// value, never a complete stream. Disconnects when the loop stops.
    pub fn heartbeat(&self) -> flume::Receiver<LatencySample> {
        self.shared.heartbeat_rx.clone()
    }

    /// A pulse immediately before each callback invocation. Best-effort,
    /// drop-on-full. Disconnects when the loop stops.
    pub fn pulses(&self) -> flume::Receiver<LoopPulse> {
        self.shared.pulse_rx.clone()
    }

    /// Windowed execution statistics at heartbeat cadence. Best-effort,
    /// drop-on-full. Disconnects when the loop stops.
    pub fn stats(&self) -> flume::Receiver<LoopStats> {
        self.shared.stats_rx.clone()
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.shared.stop(None);
        let runner = self.shared.cell.lock().unwrap().runner.take();
        if let Some(runner) = runner {
            let _ = runner.join();
        }
    }
}

/// Control handle detached from the loop's ownership.
///
/// Lets code that does not own the [`GameLoop`] (another thread, or the step
/// callbacks themselves) stop the loop or observe its lifecycle.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Arc<Shared>,
}

impl LoopHandle {
    /// Same semantics as [`GameLoop::stop`].
    pub fn stop(&self, cause: Option<LoopError>) {
        self.shared.stop(cause);
    }

    /// Same semantics as [`GameLoop::done`].
    pub fn done(&self) -> DoneSignal {
        self.shared.done.clone()
    }

    /// Same semantics as [`GameLoop::err`].
    pub fn err(&self) -> Option<Arc<LoopError>> {
        self.shared.err()
    }

    /// Same semantics as [`GameLoop::phase`].
    pub fn phase(&self) -> LifecyclePhase {
        self.shared.phase()
    }
}

struct Runner {
    shared: Arc<Shared>,
    render: StepFn,
    simulate: StepFn,
    pacing: Pacing,
    heartbeat: Pulse<LatencySample>,
    pulses: Pulse<LoopPulse>,
    stats: Pulse<LoopStats>,
    render_latency: LatencyTracker,
    simulate_latency: LatencyTracker,
    render_profile: StatProfile,
    simulate_profile: StatProfile,
    previous_tick: Instant,
    last_render: Instant,
    last_simulate: Instant,
    frame: u64,
    dropped_backlog: Duration,
}

fn run(
    shared: Arc<Shared>,
    shutdown: crossbeam_channel::Receiver<()>,
    parts: RunnerParts,
    latch: DoneLatch,
) {
    let RunnerParts {
        render,
        simulate,
        pacing,
        heartbeat,
        pulses,
        stats,
        heartbeat_period,
    } = parts;

    let ticker = tick(pacing.base_period());
    let heartbeat_timer = tick(heartbeat_period);

    let now = Instant::now();
    let mut runner = Runner {
        shared,
        render,
        simulate,
        pacing,
        heartbeat,
        pulses,
        stats,
        render_latency: LatencyTracker::new(),
        simulate_latency: LatencyTracker::new(),
        render_profile: StatProfile::new(STAT_WINDOW_SAMPLES),
        simulate_profile: StatProfile::new(STAT_WINDOW_SAMPLES),
        previous_tick: now,
        last_render: now,
        last_simulate: now,
        frame: 0,
        dropped_backlog: Duration::ZERO,
    };

    log::info!("loop runner started");
    loop {
        select! {
            recv(shutdown) -> _ => {
                log::debug!("shutdown signal received");
                break;
            }
            recv(ticker) -> _ => {
                if !runner.on_tick() {
                    break;
                }
            }
            recv(heartbeat_timer) -> _ => runner.on_heartbeat(),
        }
    }

    // Close the telemetry channels before the done signal fires, so an
    // observer woken by `done` finds them already disconnected.
    drop(runner);
    latch.release();
    log::info!("loop runner stopped");
}

impl Runner {
    /// One base tick: feed elapsed wall time to the accumulators, drain the
    /// fixed-step backlog, then run the elastic step at most once. Returns
    /// false once the loop must exit.
    fn on_tick(&mut self) -> bool {
        let now = Instant::now();
        let delta = now.duration_since(self.previous_tick);
        self.previous_tick = now;

        let dropped = self.pacing.advance(delta);
        if !dropped.is_zero() {
            self.dropped_backlog += dropped;
            log::warn!(
                "simulation backlog over bound, dropping {dropped:?} of wall time \
                 ({:?} total)",
                self.dropped_backlog
            );
        }

        loop {
            if self.is_stopped() {
                return false;
            }
            let Some(step) = self.pacing.next_simulation_step() else {
                break;
            };
            if !self.invoke(StepOrigin::Simulate, step) {
                return false;
            }
        }

        if self.is_stopped() {
            return false;
        }
        if let Some(work) = self.pacing.next_render_step() {
            if !self.invoke(StepOrigin::Render, work) {
                return false;
            }
        }

        self.frame += 1;
        true
    }

    /// Runs one callback invocation: pulse first, then the call bracketed by
    /// its profile, then latency credit or error wrapping.
    fn invoke(&mut self, origin: StepOrigin, step: Duration) -> bool {
        let (callback, last_run, tracker, profile) = match origin {
            StepOrigin::Simulate => (
                &mut self.simulate,
                &mut self.last_simulate,
                &mut self.simulate_latency,
                &mut self.simulate_profile,
            ),
            StepOrigin::Render => (
                &mut self.render,
                &mut self.last_render,
                &mut self.render_latency,
                &mut self.render_profile,
            ),
        };

        let now = Instant::now();
        let spacing = now.duration_since(*last_run);
        *last_run = now;
        self.pulses.publish(LoopPulse {
            origin,
            spacing,
            frame: self.frame,
        });

        log::trace!("{origin} step of {step:?} (frame {})", self.frame);
        profile.mark_start();
        let result = callback(step);
        profile.mark_end();

        match result {
            Ok(()) => {
                tracker.mark_done(step);
                true
            }
            Err(cause) => {
                log::error!("{origin} step failed at frame {}: {cause:#}", self.frame);
                let failed_at = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default();
                let envelope = StepError::new(origin, step, cause)
                    .with_diagnostic("frame", self.frame.to_string())
                    .with_diagnostic("step", format!("{step:?}"))
                    .with_diagnostic("failed_at_unix_ms", failed_at.as_millis().to_string());
                self.shared.stop(Some(LoopError::Step(envelope)));
                false
            }
        }
    }

    fn on_heartbeat(&mut self) {
        let sample = LatencySample {
            render_latency: self.render_latency.latency(),
            simulate_latency: self.simulate_latency.latency(),
        };
        log::trace!(
            "heartbeat: render {:?} behind, simulate {:?} behind",
            sample.render_latency,
            sample.simulate_latency
        );
        self.heartbeat.publish(sample);
        self.stats.publish(LoopStats::collect(
            self.frame,
            self.dropped_backlog,
            &self.render_profile,
            &self.simulate_profile,
        ));
    }

    fn is_stopped(&self) -> bool {
        self.shared.cell.lock().unwrap().phase.is_terminal()
    }
}
