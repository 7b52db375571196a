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

//! The CPU-side fence wrapper.
//!
//! A [`Fence`] is the only coordination primitive between the CPU submitting
//! commands and the GPU executing them at an unknown future time. It is
//! created once per device with an initial value and lives for the device's
//! lifetime. Signaling and waiting are the only suspension points in the
//! subsystem; there is no cancellation.

use crate::api::common::{FenceHandle, FenceValue};
use crate::error::{DeviceError, FenceError};
use crate::traits::GraphicsBackend;
use std::sync::Arc;
use std::time::Duration;

/// A monotonic completion counter shared between CPU and GPU.
///
/// The wrapper keeps two pieces of bookkeeping on top of the backend fence:
/// the last *signaled* value (to enforce strictly increasing signals) and the
/// highest *confirmed-complete* value seen so far (so [`value`](Fence::value)
/// is monotonic non-decreasing across calls even if a backend poll were to
/// regress).
#[derive(Debug)]
pub struct Fence {
    backend: Arc<dyn GraphicsBackend>,
    handle: FenceHandle,
    last_signaled: FenceValue,
    last_completed: FenceValue,
}

impl Fence {
    /// Creates a backend fence starting at `initial`.
    pub fn new(backend: Arc<dyn GraphicsBackend>, initial: FenceValue) -> Result<Self, DeviceError> {
        let handle = backend.create_fence(initial)?;
        Ok(Self {
            backend,
            handle,
            last_signaled: initial,
            last_completed: initial,
        })
    }

    /// Inserts a completion marker for `value` into the command stream.
    ///
    /// `value` must be strictly greater than any previously signaled value;
    /// violating this is a programmer error and fails with
    /// [`FenceError::NonMonotonicSignal`].
    pub fn signal(&mut self, value: FenceValue) -> Result<(), DeviceError> {
        if value <= self.last_signaled {
            return Err(FenceError::NonMonotonicSignal {
                last: self.last_signaled,
                requested: value,
            }
            .into());
        }
        self.backend.signal_fence(self.handle, value)?;
        self.last_signaled = value;
        log::trace!("fence {:?}: signaled {}", self.handle, value);
        Ok(())
    }

    /// Non-blocking poll of the highest confirmed-complete value.
    pub fn value(&mut self) -> Result<FenceValue, DeviceError> {
        let polled = self.backend.fence_value(self.handle)?;
        self.last_completed = self.last_completed.max(polled);
        Ok(self.last_completed)
    }

    /// Blocks until the fence reaches `value` or `timeout` elapses.
    ///
    /// Returns the confirmed-complete value (which may exceed `value`). A
    /// wait that cannot be satisfied within the deadline fails with
    /// [`FenceError::Timeout`] and is not retried.
    pub fn wait(&mut self, value: FenceValue, timeout: Duration) -> Result<FenceValue, DeviceError> {
        if self.last_completed >= value {
            return Ok(self.last_completed);
        }
        log::trace!(
            "fence {:?}: waiting for {} (completed: {})",
            self.handle,
            value,
            self.last_completed
        );
        let reached = self.backend.wait_fence(self.handle, value, timeout)?;
        self.last_completed = self.last_completed.max(reached);
        Ok(self.last_completed)
    }

    /// The last value passed to [`signal`](Fence::signal).
    pub fn last_signaled(&self) -> FenceValue {
        self.last_signaled
    }

    /// The backend handle behind this fence.
    pub fn handle(&self) -> FenceHandle {
        self.handle
    }
}
