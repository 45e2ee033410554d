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

//! Telemetry types and trackers for observing a running loop.
//!
//! Everything here is consumed by the loop service and surfaced to the
//! application through lossy, bounded channels: observability must never
//! affect the correctness or timing of the loop itself.

mod latency;
mod pulse;
mod sample;
mod stats;

pub use latency::LatencyTracker;
pub use pulse::Pulse;
pub use sample::{LatencySample, LoopPulse};
pub use stats::{LoopStats, StatProfile, StatWindow};
