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

//! Lifecycle phase machine and the one-shot completion signal.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Phase of a scheduling loop.
///
/// Transitions are monotonic: a loop never regresses to an earlier phase, and
/// a stopped loop cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifecyclePhase {
    /// Constructed but not yet started. No callback has run.
    #[default]
    Idle,
    /// The runner thread is live and driving ticks.
    Running,
    /// Terminal. No further callback invocation will happen.
    Stopped,
}

impl LifecyclePhase {
    /// Whether a transition from `self` to `next` is legal.
    pub fn can_advance_to(self, next: LifecyclePhase) -> bool {
        matches!(
            (self, next),
            (LifecyclePhase::Idle, LifecyclePhase::Running)
                | (LifecyclePhase::Idle, LifecyclePhase::Stopped)
                | (LifecyclePhase::Running, LifecyclePhase::Stopped)
        )
    }

    /// Whether this is the terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecyclePhase::Stopped)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePhase::Idle => write!(f, "idle"),
            LifecyclePhase::Running => write!(f, "running"),
            LifecyclePhase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Read half of the one-shot completion broadcast.
///
/// Becomes observable exactly once, when the paired [`DoneLatch`] is
/// released. Cloneable; every clone observes the same event. Built on channel
/// disconnection, so no value is ever transferred and a late waiter returns
/// immediately.
#[derive(Debug, Clone)]
pub struct DoneSignal {
    rx: flume::Receiver<()>,
}

/// Write half of the completion broadcast.
///
/// Releasing it (or simply dropping it) fires the paired [`DoneSignal`] for
/// every clone. There is no way to fire the signal twice.
#[derive(Debug)]
pub struct DoneLatch {
    _tx: flume::Sender<()>,
}

impl DoneSignal {
    /// Creates a connected latch/signal pair.
    pub fn new() -> (DoneLatch, DoneSignal) {
        let (tx, rx) = flume::bounded(0);
        (DoneLatch { _tx: tx }, DoneSignal { rx })
    }

    /// Blocks until the signal fires; returns immediately if it already has.
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }

    /// Waits up to `timeout` for the signal. Returns true if it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(flume::RecvTimeoutError::Disconnected)
        )
    }

    /// Non-blocking check.
    pub fn is_done(&self) -> bool {
        matches!(self.rx.try_recv(), Err(flume::TryRecvError::Disconnected))
    }
}

impl DoneLatch {
    /// Fires the signal. Equivalent to dropping the latch.
    pub fn release(self) {}
}
