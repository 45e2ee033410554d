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

//! Error taxonomy for the scheduling loop.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::LifecyclePhase;

/// Which loop activity a record or failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepOrigin {
    /// The fixed-step simulation activity.
    Simulate,
    /// The elastic-step render activity.
    Render,
}

impl fmt::Display for StepOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOrigin::Simulate => write!(f, "simulate"),
            StepOrigin::Render => write!(f, "render"),
        }
    }
}

/// Envelope wrapping a failed step-callback invocation.
///
/// Carries the originating activity, a formatted message, the error the
/// callback returned, and a free-form diagnostics map holding contextual data
/// recorded at the moment of failure (frame count, wall-clock time, step
/// size). Immutable once constructed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    origin: StepOrigin,
    message: String,
    cause: Option<anyhow::Error>,
    diagnostics: BTreeMap<String, String>,
}

impl StepError {
    /// Wraps the error returned by a `step`-sized invocation of `origin`.
    pub fn new(origin: StepOrigin, step: Duration, cause: anyhow::Error) -> Self {
        Self {
            origin,
            message: format!("error returned by {origin}({step:?}): {cause:#}"),
            cause: Some(cause),
            diagnostics: BTreeMap::new(),
        }
    }

    /// Attaches one diagnostic key/value pair.
    pub fn with_diagnostic(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.diagnostics.insert(key.into(), value.into());
        self
    }

    /// The activity that failed.
    pub fn origin(&self) -> StepOrigin {
        self.origin
    }

    /// The error the callback returned.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    /// Contextual data recorded at the moment of failure.
    pub fn diagnostics(&self) -> &BTreeMap<String, String> {
        &self.diagnostics
    }
}

/// Terminal and synchronous errors surfaced by the loop.
#[derive(Debug, Error)]
pub enum LoopError {
    /// A construction parameter was rejected. Fatal to that construction
    /// attempt only; no background work has been started.
    #[error("invalid configuration: {param} {problem}")]
    Config {
        /// The offending parameter.
        param: &'static str,
        /// What was wrong with it.
        problem: &'static str,
    },

    /// `start` was called on a loop that is not idle. The loop's existing
    /// state is untouched.
    #[error("cannot start a loop that is {phase}")]
    Lifecycle {
        /// The phase the loop was in when `start` was rejected.
        phase: LifecyclePhase,
    },

    /// A step callback failed. Always fatal: the loop stops and the envelope
    /// becomes its terminal error. Never retried, never swallowed.
    #[error(transparent)]
    Step(#[from] StepError),

    /// The loop was stopped with an explicit caller-supplied cause. The inner
    /// error is carried as-is.
    #[error("{0}")]
    Aborted(anyhow::Error),
}
