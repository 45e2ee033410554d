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

//! Drift measurement between an activity's schedule and its completed work.

use std::time::{Duration, Instant};

/// Measures how far an activity lags behind its target cadence.
///
/// The tracker anchors a reference instant and accumulates the work the
/// activity has paid off since then. The reported latency is the wall time
/// not yet covered by completed work: it grows while the activity falls
/// behind and shrinks toward zero as it catches up.
///
/// Reading re-anchors the tracker so the stored instant and duration stay
/// small over arbitrarily long runs. The reported value carries over between
/// reads, but a read is an observable effect on the tracker's state, not an
/// idempotent query.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    start: Instant,
    completed_work: Duration,
}

impl LatencyTracker {
    /// Anchors the schedule at the current instant.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            completed_work: Duration::ZERO,
        }
    }

    /// Credits `work` toward the schedule.
    pub fn mark_done(&mut self, work: Duration) {
        self.completed_work += work;
    }

    /// Wall time not yet covered by completed work, saturating at zero.
    pub fn latency(&mut self) -> Duration {
        let now = Instant::now();
        let caught_up_to = self.start + self.completed_work;
        let latency = now.saturating_duration_since(caught_up_to);
        self.start = now - latency;
        self.completed_work = Duration::ZERO;
        latency
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}
