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

//! Global settings for the device and frame pacer.

use std::time::Duration;

/// Default bound on the number of frames whose GPU work may be outstanding.
pub const DEFAULT_MAX_FRAMES_IN_FLIGHT: u32 = 3;

/// Default minimum uniform-buffer offset alignment required by most APIs.
pub const MIN_UNIFORM_ALIGNMENT: u64 = 256;

/// Configuration consumed by [`Device`](crate::device::Device).
///
/// All values are supplied from outside the core; none are re-derived
/// internally. The uniform alignment in particular must come from the
/// backend's reported limits.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    /// How many submitted-but-unconfirmed frames may be outstanding before
    /// `end_frame` blocks on the fence. This bounds the transient footprint
    /// held in the upload ring buffer.
    pub max_frames_in_flight: u32,
    /// Total capacity of the default upload ring buffer in bytes.
    pub upload_capacity: u64,
    /// Minimum offset alignment for uniform-buffer binds.
    pub min_uniform_alignment: u64,
    /// Deadline for any single blocking fence wait. Exceeding it is treated
    /// as a GPU hang and surfaces as a timeout error, not a retry.
    pub fence_timeout: Duration,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            max_frames_in_flight: DEFAULT_MAX_FRAMES_IN_FLIGHT,
            upload_capacity: 8 * 1024 * 1024,
            min_uniform_alignment: MIN_UNIFORM_ALIGNMENT,
            fence_timeout: Duration::from_secs(2),
        }
    }
}
