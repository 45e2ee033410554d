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

//! Configuration for the scheduling service.

use std::time::Duration;

use rythmos_core::pacing::DEFAULT_MAX_CATCH_UP_STEPS;

/// One sixtieth of a second, the usual step for 60 Hz activities.
pub const HZ60_STEP: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Configuration for a [`GameLoop`](crate::GameLoop).
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Minimum spacing between render invocations; the upper bound on the
    /// effective frame rate.
    pub render_period: Duration,
    /// The fixed step handed to every simulation invocation.
    pub simulation_period: Duration,
    /// Bound on fixed-step catch-up, in whole steps of `simulation_period`.
    /// Wall time beyond the bound is dropped and accounted in
    /// [`LoopStats`](rythmos_core::telemetry::LoopStats). `None` disables the
    /// bound, letting a sustained overload starve rendering indefinitely.
    pub max_catch_up_steps: Option<u32>,
    /// Cadence of the heartbeat and stats channels.
    pub heartbeat_period: Duration,
}

impl LoopConfig {
    /// Configuration with the given periods and default bounds.
    pub fn with_periods(render_period: Duration, simulation_period: Duration) -> Self {
        Self {
            render_period,
            simulation_period,
            ..Self::default()
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            render_period: HZ60_STEP,
            simulation_period: HZ60_STEP,
            max_catch_up_steps: Some(DEFAULT_MAX_CATCH_UP_STEPS),
            heartbeat_period: Duration::from_secs(1),
        }
    }
}
