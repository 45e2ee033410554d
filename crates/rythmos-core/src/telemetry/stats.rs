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

//! Windowed runtime and frequency statistics for loop activities.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// A fixed-capacity ring of duration samples.
#[derive(Debug, Clone)]
pub struct StatWindow {
    samples: Vec<Duration>,
    cursor: usize,
    filled: usize,
}

impl StatWindow {
    /// Creates a window holding up to `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: vec![Duration::ZERO; capacity],
            cursor: 0,
            filled: 0,
        }
    }

    /// Records a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: Duration) {
        self.samples[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % self.samples.len();
        self.filled = (self.filled + 1).min(self.samples.len());
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Whether no sample has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Mean and standard deviation over the held samples; zeros when empty.
    pub fn report(&self) -> (Duration, Duration) {
        if self.filled == 0 {
            return (Duration::ZERO, Duration::ZERO);
        }

        let held = &self.samples[..self.filled];
        let sum: Duration = held.iter().sum();
        let mean = sum / self.filled as u32;

        let mean_secs = mean.as_secs_f64();
        let variance = held
            .iter()
            .map(|sample| {
                let deviation = sample.as_secs_f64() - mean_secs;
                deviation * deviation
            })
            .sum::<f64>()
            / self.filled as f64;

        (mean, Duration::from_secs_f64(variance.sqrt()))
    }
}

/// Invocation profile for one activity: arrival spacing and service time.
#[derive(Debug, Clone)]
pub struct StatProfile {
    arrival: StatWindow,
    service: StatWindow,
    last_start: Instant,
}

impl StatProfile {
    /// Creates a profile whose windows hold up to `capacity` samples each.
    pub fn new(capacity: usize) -> Self {
        Self {
            arrival: StatWindow::new(capacity),
            service: StatWindow::new(capacity),
            last_start: Instant::now(),
        }
    }

    /// Records arrival spacing; call immediately before the activity runs.
    pub fn mark_start(&mut self) {
        let now = Instant::now();
        self.arrival.push(now.duration_since(self.last_start));
        self.last_start = now;
    }

    /// Records service time; call immediately after the activity returns.
    pub fn mark_end(&mut self) {
        self.service.push(self.last_start.elapsed());
    }

    /// Mean and standard deviation of the spacing between invocations.
    pub fn arrival_report(&self) -> (Duration, Duration) {
        self.arrival.report()
    }

    /// Mean and standard deviation of the invocation duration.
    pub fn service_report(&self) -> (Duration, Duration) {
        self.service.report()
    }
}

/// Snapshot of loop execution statistics, published at heartbeat cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Base-tick counter at snapshot time.
    pub frame: u64,
    /// Total wall time discarded by the simulation backlog bound.
    pub dropped_backlog: Duration,
    /// Mean spacing between render invocations.
    pub render_arrival_mean: Duration,
    /// Standard deviation of the render invocation spacing.
    pub render_arrival_std_dev: Duration,
    /// Mean render invocation duration.
    pub render_service_mean: Duration,
    /// Standard deviation of the render invocation duration.
    pub render_service_std_dev: Duration,
    /// Mean spacing between simulation invocations.
    pub simulate_arrival_mean: Duration,
    /// Standard deviation of the simulation invocation spacing.
    pub simulate_arrival_std_dev: Duration,
    /// Mean simulation invocation duration.
    pub simulate_service_mean: Duration,
    /// Standard deviation of the simulation invocation duration.
    pub simulate_service_std_dev: Duration,
}

impl LoopStats {
    /// Snapshots both activity profiles.
    pub fn collect(
        frame: u64,
        dropped_backlog: Duration,
        render: &StatProfile,
        simulate: &StatProfile,
    ) -> Self {
        let (render_arrival_mean, render_arrival_std_dev) = render.arrival_report();
        let (render_service_mean, render_service_std_dev) = render.service_report();
        let (simulate_arrival_mean, simulate_arrival_std_dev) = simulate.arrival_report();
        let (simulate_service_mean, simulate_service_std_dev) = simulate.service_report();

        Self {
            frame,
            dropped_backlog,
            render_arrival_mean,
            render_arrival_std_dev,
            render_service_mean,
            render_service_std_dev,
            simulate_arrival_mean,
            simulate_arrival_std_dev,
            simulate_service_mean,
            simulate_service_std_dev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn window_reports_mean_and_std_dev() {
        let mut window = StatWindow::new(16);
        for sample in [10u64, 20, 30] {
            window.push(ms(sample));
        }

        let (mean, std_dev) = window.report();
        assert_eq!(mean, ms(20));
        // Population std dev of {10, 20, 30}ms is sqrt(200/3) ms.
        assert_relative_eq!(
            std_dev.as_secs_f64(),
            (200.0f64 / 3.0).sqrt() / 1000.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn empty_window_reports_zeros() {
        let window = StatWindow::new(8);
        assert!(window.is_empty());
        assert_eq!(window.report(), (Duration::ZERO, Duration::ZERO));
    }

    #[test]
    fn window_wraps_and_keeps_the_latest_samples() {
        let mut window = StatWindow::new(2);
        window.push(ms(10));
        window.push(ms(20));
        window.push(ms(30));

        assert_eq!(window.len(), 2);
        let (mean, _) = window.report();
        assert_eq!(mean, ms(25));
    }

    #[test]
    fn profile_brackets_invocations() {
        let mut profile = StatProfile::new(8);

        for _ in 0..3 {
            profile.mark_start();
            thread::sleep(ms(10));
            profile.mark_end();
        }

        let (service_mean, _) = profile.service_report();
        assert!(
            service_mean >= ms(10),
            "service mean ({service_mean:?}) should cover the sleep"
        );
        assert!(service_mean < ms(210));

        let (arrival_mean, _) = profile.arrival_report();
        assert!(
            arrival_mean >= ms(6),
            "arrival mean ({arrival_mean:?}) should reflect the invocation spacing"
        );
    }

    #[test]
    fn collect_records_frame_and_dropped_backlog() {
        let render = StatProfile::new(4);
        let simulate = StatProfile::new(4);

        let stats = LoopStats::collect(42, ms(7), &render, &simulate);
        assert_eq!(stats.frame, 42);
        assert_eq!(stats.dropped_backlog, ms(7));
        assert_eq!(stats.render_service_mean, Duration::ZERO);
        assert_eq!(stats.simulate_arrival_std_dev, Duration::ZERO);
    }
}
