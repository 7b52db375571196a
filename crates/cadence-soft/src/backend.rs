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

//! The software implementation of [`GraphicsBackend`].

use cadence_gpu::error::{DeviceError, FenceError};
use cadence_gpu::traits::GraphicsBackend;
use cadence_gpu::{
    AdapterInfo, BackendKind, BufferDescriptor, BufferId, BufferUsage, FenceHandle, FenceValue,
    IndexFormat, RawBufferSlice, TextureDescriptor, TextureId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// One bind operation observed by the backend, kept for test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindCall {
    /// A vertex buffer bind.
    Vertex {
        /// Vertex input slot.
        slot: u32,
        /// The bound buffer.
        buffer: BufferId,
        /// Byte offset of the first vertex.
        offset: u64,
    },
    /// An index buffer bind.
    Index {
        /// The bound buffer.
        buffer: BufferId,
        /// Element type of the indices.
        format: IndexFormat,
        /// Byte offset of the first index.
        offset: u64,
    },
    /// A sampled-texture bind.
    Texture {
        /// Texture unit index.
        unit: u32,
        /// The bound texture.
        texture: TextureId,
    },
    /// A read/write texture bind.
    RwTexture {
        /// Image unit index.
        unit: u32,
        /// The bound texture.
        texture: TextureId,
    },
    /// A uniform byte-range bind.
    Uniform {
        /// Uniform binding slot.
        slot: u32,
        /// The bound range.
        slice: RawBufferSlice,
    },
}

#[derive(Debug)]
struct SoftBuffer {
    bytes: Vec<u8>,
    usage: BufferUsage,
    label: Option<String>,
}

#[derive(Debug)]
struct SoftTexture {
    #[allow(dead_code)]
    label: Option<String>,
}

#[derive(Debug, Default)]
struct SoftState {
    buffers: HashMap<BufferId, SoftBuffer>,
    textures: HashMap<TextureId, SoftTexture>,
    fences: HashMap<FenceHandle, FenceValue>,
    waits: Vec<FenceValue>,
    binds: Vec<BindCall>,
    destroyed_buffers: Vec<BufferId>,
}

/// A CPU-only [`GraphicsBackend`] with real byte storage.
///
/// Fences follow one of two completion models:
///
/// - **immediate** (the default): a signal retires as soon as it is issued,
///   modeling a GPU that always keeps up with the CPU;
/// - **manual**: signals stay outstanding until the test advances the fence
///   with [`complete_fence_to`](SoftBackend::complete_fence_to), which makes
///   frames-in-flight backpressure and timeouts observable.
///
/// Waits block on a condition variable, so a manual fence may be advanced
/// from another thread while the frame loop is parked in `wait_fence`.
#[derive(Debug)]
pub struct SoftBackend {
    state: Mutex<SoftState>,
    fence_advanced: Condvar,
    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    next_fence_id: AtomicU64,
    immediate_fences: bool,
}

impl SoftBackend {
    /// A backend whose fences complete immediately on signal.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SoftState::default()),
            fence_advanced: Condvar::new(),
            next_buffer_id: AtomicUsize::new(1),
            next_texture_id: AtomicUsize::new(1),
            next_fence_id: AtomicU64::new(1),
            immediate_fences: true,
        }
    }

    /// A backend whose fences only advance via
    /// [`complete_fence_to`](SoftBackend::complete_fence_to).
    pub fn with_manual_fences() -> Self {
        Self {
            immediate_fences: false,
            ..Self::new()
        }
    }

    /// Advances a fence's confirmed-complete value to at least `value` and
    /// wakes any parked waiter.
    pub fn complete_fence_to(&self, fence: FenceHandle, value: FenceValue) {
        let mut state = self.state.lock().unwrap();
        if let Some(completed) = state.fences.get_mut(&fence) {
            *completed = (*completed).max(value);
            log::trace!("soft fence {:?} advanced to {}", fence, *completed);
        }
        drop(state);
        self.fence_advanced.notify_all();
    }

    /// The fence values passed to `wait_fence`, in call order.
    pub fn recorded_waits(&self) -> Vec<FenceValue> {
        self.state.lock().unwrap().waits.clone()
    }

    /// The bind calls issued so far, in call order.
    pub fn recorded_binds(&self) -> Vec<BindCall> {
        self.state.lock().unwrap().binds.clone()
    }

    /// Buffers destroyed so far, in destruction order.
    pub fn destroyed_buffers(&self) -> Vec<BufferId> {
        self.state.lock().unwrap().destroyed_buffers.clone()
    }

    /// Number of currently live buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().unwrap().buffers.len()
    }

    fn unknown<T>(what: &str, id: impl std::fmt::Debug) -> Result<T, DeviceError> {
        Err(DeviceError::Backend(format!("unknown {what} {id:?}")))
    }
}

impl Default for SoftBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for SoftBackend {
    fn create_fence(&self, initial: FenceValue) -> Result<FenceHandle, DeviceError> {
        let handle = FenceHandle(self.next_fence_id.fetch_add(1, Ordering::Relaxed));
        self.state.lock().unwrap().fences.insert(handle, initial);
        Ok(handle)
    }

    fn signal_fence(&self, fence: FenceHandle, value: FenceValue) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        match state.fences.get_mut(&fence) {
            Some(completed) => {
                if self.immediate_fences {
                    *completed = (*completed).max(value);
                }
                Ok(())
            }
            None => Self::unknown("fence", fence),
        }
    }

    fn fence_value(&self, fence: FenceHandle) -> Result<FenceValue, DeviceError> {
        let state = self.state.lock().unwrap();
        match state.fences.get(&fence) {
            Some(completed) => Ok(*completed),
            None => Self::unknown("fence", fence),
        }
    }

    fn wait_fence(
        &self,
        fence: FenceHandle,
        value: FenceValue,
        timeout: Duration,
    ) -> Result<FenceValue, DeviceError> {
        let start = Instant::now();
        let mut state = self.state.lock().unwrap();
        state.waits.push(value);
        loop {
            let completed = match state.fences.get(&fence) {
                Some(completed) => *completed,
                None => return Self::unknown("fence", fence),
            };
            if completed >= value {
                return Ok(completed);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                log::warn!(
                    "soft fence {:?} wait for {} timed out at {} after {:?}",
                    fence,
                    value,
                    completed,
                    elapsed
                );
                return Err(FenceError::Timeout {
                    target: value,
                    completed,
                    waited: elapsed,
                }
                .into());
            }
            let (guard, _timed_out) = self
                .fence_advanced
                .wait_timeout(state, timeout - elapsed)
                .unwrap();
            state = guard;
        }
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, DeviceError> {
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        let label = descriptor.label.as_ref().map(|l| l.to_string());
        log::debug!(
            "soft buffer {:?} created: {} bytes, {:?} ({:?})",
            id,
            descriptor.size,
            descriptor.usage,
            label
        );
        self.state.lock().unwrap().buffers.insert(
            id,
            SoftBuffer {
                bytes: vec![0; descriptor.size as usize],
                usage: descriptor.usage,
                label,
            },
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        match state.buffers.remove(&id) {
            Some(buffer) => {
                log::debug!("soft buffer {:?} destroyed ({:?})", id, buffer.label);
                state.destroyed_buffers.push(id);
                Ok(())
            }
            None => Self::unknown("buffer", id),
        }
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        let buffer = match state.buffers.get_mut(&id) {
            Some(buffer) => buffer,
            None => return Self::unknown("buffer", id),
        };
        if !buffer.usage.contains(BufferUsage::MAP_WRITE) {
            return Err(DeviceError::InvalidUsage(format!(
                "buffer {:?} ({:?}) was not created with MAP_WRITE",
                id, buffer.label
            )));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.bytes.len() {
            return Err(DeviceError::InvalidUsage(format!(
                "write of {}..{} exceeds buffer {:?} ({} bytes)",
                start,
                end,
                id,
                buffer.bytes.len()
            )));
        }
        buffer.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, offset: u64, len: u64) -> Result<Vec<u8>, DeviceError> {
        let state = self.state.lock().unwrap();
        let buffer = match state.buffers.get(&id) {
            Some(buffer) => buffer,
            None => return Self::unknown("buffer", id),
        };
        if !buffer
            .usage
            .intersects(BufferUsage::MAP_READ | BufferUsage::MAP_WRITE)
        {
            return Err(DeviceError::InvalidUsage(format!(
                "buffer {:?} ({:?}) is not CPU-mappable",
                id, buffer.label
            )));
        }
        let start = offset as usize;
        let end = start + len as usize;
        if end > buffer.bytes.len() {
            return Err(DeviceError::InvalidUsage(format!(
                "read of {}..{} exceeds buffer {:?} ({} bytes)",
                start,
                end,
                id,
                buffer.bytes.len()
            )));
        }
        Ok(buffer.bytes[start..end].to_vec())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, DeviceError> {
        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        self.state.lock().unwrap().textures.insert(
            id,
            SoftTexture {
                label: descriptor.label.as_ref().map(|l| l.to_string()),
            },
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        match state.textures.remove(&id) {
            Some(_) => Ok(()),
            None => Self::unknown("texture", id),
        }
    }

    fn bind_vertex_buffer(
        &self,
        slot: u32,
        buffer: BufferId,
        offset: u64,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.buffers.contains_key(&buffer) {
            return Self::unknown("buffer", buffer);
        }
        state.binds.push(BindCall::Vertex {
            slot,
            buffer,
            offset,
        });
        Ok(())
    }

    fn bind_index_buffer(
        &self,
        buffer: BufferId,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.buffers.contains_key(&buffer) {
            return Self::unknown("buffer", buffer);
        }
        state.binds.push(BindCall::Index {
            buffer,
            format,
            offset,
        });
        Ok(())
    }

    fn bind_texture_unit(&self, unit: u32, texture: TextureId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.textures.contains_key(&texture) {
            return Self::unknown("texture", texture);
        }
        state.binds.push(BindCall::Texture { unit, texture });
        Ok(())
    }

    fn bind_rw_texture_unit(&self, unit: u32, texture: TextureId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.textures.contains_key(&texture) {
            return Self::unknown("texture", texture);
        }
        state.binds.push(BindCall::RwTexture { unit, texture });
        Ok(())
    }

    fn bind_uniform_slice(&self, slot: u32, slice: RawBufferSlice) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.buffers.contains_key(&slice.buffer) {
            return Self::unknown("buffer", slice.buffer);
        }
        state.binds.push(BindCall::Uniform { slot, slice });
        Ok(())
    }

    fn adapter_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: "cadence software device".to_string(),
            kind: BackendKind::Software,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_fences_retire_on_signal() {
        let backend = SoftBackend::new();
        let fence = backend.create_fence(0).unwrap();
        backend.signal_fence(fence, 3).unwrap();
        assert_eq!(backend.fence_value(fence).unwrap(), 3);
        assert_eq!(
            backend
                .wait_fence(fence, 3, Duration::from_millis(1))
                .unwrap(),
            3
        );
    }

    #[test]
    fn manual_fence_wait_times_out() {
        let backend = SoftBackend::with_manual_fences();
        let fence = backend.create_fence(0).unwrap();
        backend.signal_fence(fence, 1).unwrap();

        let err = backend
            .wait_fence(fence, 1, Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Fence(FenceError::Timeout { target: 1, .. })
        ));
        assert_eq!(backend.recorded_waits(), vec![1]);
    }

    #[test]
    fn manual_fence_wait_is_released_from_another_thread() {
        use std::sync::Arc;

        let backend = Arc::new(SoftBackend::with_manual_fences());
        let fence = backend.create_fence(0).unwrap();
        backend.signal_fence(fence, 1).unwrap();

        let advancer = {
            let backend = Arc::clone(&backend);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                backend.complete_fence_to(fence, 1);
            })
        };

        let reached = backend
            .wait_fence(fence, 1, Duration::from_secs(2))
            .unwrap();
        assert_eq!(reached, 1);
        advancer.join().unwrap();
    }

    #[test]
    fn cpu_write_requires_map_write_usage() {
        let backend = SoftBackend::new();
        let gpu_only = backend
            .create_buffer(&BufferDescriptor {
                label: Some("gpu only".into()),
                size: 64,
                usage: BufferUsage::VERTEX,
            })
            .unwrap();

        let err = backend.write_buffer(gpu_only, 0, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidUsage(_)));
        let err = backend.read_buffer(gpu_only, 0, 3).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidUsage(_)));
    }

    #[test]
    fn writes_land_in_buffer_storage() {
        let backend = SoftBackend::new();
        let staging = backend
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::MAP_WRITE,
            })
            .unwrap();

        backend.write_buffer(staging, 4, &[7, 8, 9]).unwrap();
        assert_eq!(backend.read_buffer(staging, 4, 3).unwrap(), vec![7, 8, 9]);
        assert_eq!(backend.read_buffer(staging, 0, 1).unwrap(), vec![0]);

        // Out-of-bounds access is refused.
        assert!(backend.write_buffer(staging, 15, &[0, 0]).is_err());
    }

    #[test]
    fn binds_validate_resource_existence() {
        let backend = SoftBackend::new();
        let err = backend
            .bind_vertex_buffer(0, BufferId(999), 0)
            .unwrap_err();
        assert!(matches!(err, DeviceError::Backend(_)));
    }
}
