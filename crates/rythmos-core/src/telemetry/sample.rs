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

//! Published telemetry value types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StepOrigin;

/// How far behind schedule each activity is, published at heartbeat cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Drift of the elastic-step render activity.
    pub render_latency: Duration,
    /// Drift of the fixed-step simulation activity.
    pub simulate_latency: Duration,
}

/// Emitted immediately before each callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPulse {
    /// Which activity is about to run.
    pub origin: StepOrigin,
    /// Wall time since the previous invocation of the same activity.
    pub spacing: Duration,
    /// Base-tick counter at the time of the pulse.
    pub frame: u64,
}
