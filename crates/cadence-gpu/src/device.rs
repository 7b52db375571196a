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

//! The device: frame pacing and ownership of the default transient allocator.
//!
//! One CPU thread drives frame submission; concurrency in this subsystem is
//! temporal, between that thread and the asynchronous GPU executor, mediated
//! entirely by fence values. The `&mut self` receivers make the
//! single-mutator assumption a compile-time fact; sharing a [`Device`] across
//! submitting threads would require an external mutex.

use crate::api::*;
use crate::error::{DeviceError, UploadError};
use crate::handle::SharedHandle;
use crate::sync::{Fence, UploadRingBuffer};
use crate::traits::GraphicsBackend;
use std::sync::Arc;

/// Owns the fence, the frame counter and the default upload ring buffer for
/// one graphics backend.
///
/// The per-frame protocol:
///
/// 1. the caller performs CPU work and queues GPU commands, tagging any
///    transient allocations with the current frame's expiration date;
/// 2. [`end_frame`](Device::end_frame) increments the frame counter and
///    signals the fence with it;
/// 3. once more than `max_frames_in_flight` frames have been submitted, the
///    pacer blocks until the oldest in-flight frame's fence value is reached
///    and reclaims its ring-buffer regions.
///
/// Step 3 is the sole backpressure mechanism: it bounds the number of frames'
/// worth of transient allocations outstanding at once, and therefore bounds
/// the ring buffer's footprint.
#[derive(Debug)]
pub struct Device {
    backend: Arc<dyn GraphicsBackend>,
    fence: Fence,
    upload_ring: UploadRingBuffer,
    frame_id: u64,
    settings: DeviceSettings,
}

impl Device {
    /// Initializes a device over `backend`: one fence starting at zero and
    /// one CPU-writable upload arena of `settings.upload_capacity` bytes.
    pub fn new(
        backend: Arc<dyn GraphicsBackend>,
        settings: DeviceSettings,
    ) -> Result<Self, DeviceError> {
        let fence = Fence::new(Arc::clone(&backend), 0)?;
        let buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("upload ring".into()),
            size: settings.upload_capacity,
            usage: BufferUsage::MAP_WRITE
                | BufferUsage::UNIFORM
                | BufferUsage::VERTEX
                | BufferUsage::INDEX,
        })?;
        let upload_ring = UploadRingBuffer::new(buffer, settings.upload_capacity);
        log::debug!(
            "device initialized on {:?} ({} byte upload ring, {} frames in flight)",
            backend.adapter_info(),
            settings.upload_capacity,
            settings.max_frames_in_flight
        );
        Ok(Self {
            backend,
            fence,
            upload_ring,
            frame_id: 0,
            settings,
        })
    }

    /// Allocates a transient byte range expiring with the current frame.
    ///
    /// If the ring is exhausted, performs exactly one synchronous
    /// drain-and-retry: when the oldest pending region belongs to an
    /// already-signaled frame, wait for its fence value, reclaim, and retry
    /// the placement. When every pending region belongs to the still-open
    /// frame, waiting would deadlock (its signal has not been issued yet),
    /// so the exhaustion is surfaced immediately.
    pub fn allocate_upload(
        &mut self,
        size: u64,
        align: u64,
    ) -> Result<RawBufferSlice, DeviceError> {
        let expires = self.expiration_date();
        match self.upload_ring.allocate(size, align, expires) {
            Ok(slice) => Ok(slice),
            Err(err @ UploadError::OversizedRequest { .. }) => Err(err.into()),
            Err(err @ UploadError::Exhausted { .. }) => {
                let Some(oldest) = self.upload_ring.oldest_expiration() else {
                    return Err(err.into());
                };
                if oldest > self.fence.last_signaled() {
                    return Err(err.into());
                }
                log::debug!(
                    "upload ring exhausted, draining up to fence {} before retry",
                    oldest
                );
                self.fence.wait(oldest, self.settings.fence_timeout)?;
                self.upload_ring.reclaim(oldest);
                self.upload_ring
                    .allocate(size, align, expires)
                    .map_err(DeviceError::from)
            }
        }
    }

    /// Copies one POD value into a fresh transient allocation suitable for a
    /// uniform bind (alignment is raised to the backend's minimum
    /// uniform-offset alignment).
    pub fn upload_value<T: bytemuck::Pod>(
        &mut self,
        value: &T,
    ) -> Result<RawBufferSlice, DeviceError> {
        let align = (std::mem::align_of::<T>() as u64).max(self.settings.min_uniform_alignment);
        let slice = self.allocate_upload(std::mem::size_of::<T>() as u64, align)?;
        self.backend
            .write_buffer(slice.buffer, slice.offset, bytemuck::bytes_of(value))?;
        Ok(slice)
    }

    /// Creates a persistent buffer whose last owner destroys it exactly once.
    pub fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
    ) -> Result<SharedHandle<BufferId>, DeviceError> {
        let id = self.backend.create_buffer(descriptor)?;
        let backend = Arc::clone(&self.backend);
        Ok(SharedHandle::new(id, move |id| {
            if let Err(err) = backend.destroy_buffer(id) {
                log::warn!("failed to destroy buffer {:?}: {}", id, err);
            }
        }))
    }

    /// Creates a persistent texture whose last owner destroys it exactly once.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<SharedHandle<TextureId>, DeviceError> {
        let id = self.backend.create_texture(descriptor)?;
        let backend = Arc::clone(&self.backend);
        Ok(SharedHandle::new(id, move |id| {
            if let Err(err) = backend.destroy_texture(id) {
                log::warn!("failed to destroy texture {:?}: {}", id, err);
            }
        }))
    }

    /// Ends the current frame: signals the fence with the new frame id and,
    /// once the frames-in-flight bound is exceeded, blocks until the oldest
    /// in-flight frame completed and reclaims its transient allocations.
    pub fn end_frame(&mut self) -> Result<(), DeviceError> {
        self.frame_id += 1;
        self.fence.signal(self.frame_id)?;

        let max_in_flight = u64::from(self.settings.max_frames_in_flight);
        if self.frame_id >= max_in_flight {
            let oldest_done = self.frame_id - max_in_flight + 1;
            self.fence.wait(oldest_done, self.settings.fence_timeout)?;
            self.upload_ring.reclaim(oldest_done);
        }
        Ok(())
    }

    /// Runs one frame render callback, then [`end_frame`](Device::end_frame).
    pub fn frame<F>(&mut self, render: F) -> Result<(), DeviceError>
    where
        F: FnOnce(&mut Device) -> Result<(), DeviceError>,
    {
        render(self)?;
        self.end_frame()
    }

    /// The id of the frame currently being recorded (starts at 0).
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// The fence value at which the current frame's transient allocations
    /// become reclaimable.
    pub fn expiration_date(&self) -> FenceValue {
        self.frame_id + 1
    }

    /// The backend this device drives.
    pub fn backend(&self) -> &Arc<dyn GraphicsBackend> {
        &self.backend
    }

    /// The device fence.
    pub fn fence(&self) -> &Fence {
        &self.fence
    }

    /// The default transient upload allocator, for telemetry.
    pub fn upload_ring(&self) -> &UploadRingBuffer {
        &self.upload_ring
    }

    /// The settings this device was created with.
    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }
}
