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

//! # Rythmos Core
//!
//! Foundational crate for the rythmos scheduling core: the catch-up pacing
//! arithmetic, the lifecycle contracts, the error taxonomy, and the telemetry
//! types used to observe a running loop.
//!
//! This crate contains no background execution. The service that drives these
//! pieces from a runner thread lives in `rythmos-control`.

#![warn(missing_docs)]

pub mod error;
pub mod lifecycle;
pub mod pacing;
pub mod telemetry;

pub use error::{LoopError, StepError, StepOrigin};
pub use lifecycle::{DoneLatch, DoneSignal, LifecyclePhase};
pub use pacing::Pacing;
