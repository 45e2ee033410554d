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

//! Lossy, bounded publication of telemetry values.

/// A best-effort publisher for the most recent telemetry value of type `T`.
///
/// Capacity is one: if no consumer has drained the previous value, the new
/// one is dropped on the floor. This is lossy by design — the publisher must
/// never block or accumulate backlog, so a slow or absent consumer cannot
/// stall the producing loop. Consumers get a roughly-current value, never a
/// guaranteed-complete stream.
///
/// Dropping the `Pulse` disconnects every subscribed receiver, which is how
/// consumers learn that the stream has closed.
#[derive(Debug)]
pub struct Pulse<T> {
    tx: flume::Sender<T>,
    rx: flume::Receiver<T>,
}

impl<T> Pulse<T> {
    /// Creates a publisher with a single-value buffer.
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(1);
        Self { tx, rx }
    }

    /// Publishes `value` without blocking; drops it if the buffer is full.
    pub fn publish(&self, value: T) {
        if self.tx.try_send(value).is_err() {
            log::trace!("no consumer ready, dropping telemetry value");
        }
    }

    /// Returns a new receiving handle.
    ///
    /// Receivers share the underlying queue: each published value is consumed
    /// by exactly one of them.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.rx.clone()
    }
}

impl<T> Default for Pulse<T> {
    fn default() -> Self {
        Self::new()
    }
}
