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

//! # Rythmos Control
//!
//! The scheduling service. A [`GameLoop`] drives two activities from one
//! wall-clock source: a fixed-step simulation that is invoked as many times
//! as needed to catch up to real time (always with the same step size), and
//! an elastic-step renderer that runs at most once per tick and receives
//! however much time has actually elapsed, never exceeding its configured
//! rate.
//!
//! ```
//! use std::time::Duration;
//! use rythmos_control::GameLoop;
//!
//! let game_loop = GameLoop::new(
//!     |_step| Ok(()),
//!     |_step| Ok(()),
//!     Duration::from_millis(16),
//!     Duration::from_millis(10),
//! )?;
//! game_loop.start()?;
//! game_loop.stop(None);
//! game_loop.done().wait();
//! assert!(game_loop.err().is_none());
//! # Ok::<(), rythmos_core::LoopError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod scheduler;

pub use config::{LoopConfig, HZ60_STEP};
pub use scheduler::{GameLoop, LoopHandle, StepFn};

pub use rythmos_core::telemetry::{LatencySample, LoopPulse, LoopStats};
pub use rythmos_core::{DoneSignal, LifecyclePhase, LoopError, StepError, StepOrigin};
