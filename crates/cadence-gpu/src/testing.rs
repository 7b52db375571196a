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

//! A recording in-memory backend for unit tests.

use crate::api::*;
use crate::error::{DeviceError, FenceError};
use crate::traits::GraphicsBackend;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One backend call observed by [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindCall {
    Vertex {
        slot: u32,
        buffer: BufferId,
        offset: u64,
    },
    Index {
        buffer: BufferId,
        format: IndexFormat,
        offset: u64,
    },
    Texture {
        unit: u32,
        texture: TextureId,
    },
    RwTexture {
        unit: u32,
        texture: TextureId,
    },
    Uniform {
        slot: u32,
        slice: RawBufferSlice,
    },
}

#[derive(Debug)]
struct BufferEntry {
    bytes: Vec<u8>,
    usage: BufferUsage,
}

#[derive(Debug, Default)]
struct State {
    next_id: usize,
    buffers: HashMap<BufferId, BufferEntry>,
    textures: HashMap<TextureId, ()>,
    fences: HashMap<FenceHandle, FenceValue>,
    waits: Vec<FenceValue>,
    binds: Vec<BindCall>,
    destroyed_buffers: Vec<BufferId>,
    destroyed_textures: Vec<TextureId>,
}

/// An in-memory [`GraphicsBackend`] that stores buffer bytes, retires fence
/// signals either immediately (the default, like a GPU that keeps up) or
/// only when the test advances them, and records waits, binds and destroys
/// for assertions.
#[derive(Debug)]
pub(crate) struct RecordingBackend {
    state: Mutex<State>,
    auto_complete: bool,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            auto_complete: true,
        }
    }

    pub(crate) fn with_manual_fences() -> Self {
        Self {
            state: Mutex::new(State::default()),
            auto_complete: false,
        }
    }

    /// Advances every fence's confirmed-complete value to at least `value`.
    pub(crate) fn complete_fences_to(&self, value: FenceValue) {
        let mut state = self.state.lock().unwrap();
        for completed in state.fences.values_mut() {
            *completed = (*completed).max(value);
        }
    }

    pub(crate) fn recorded_waits(&self) -> Vec<FenceValue> {
        self.state.lock().unwrap().waits.clone()
    }

    pub(crate) fn recorded_binds(&self) -> Vec<BindCall> {
        self.state.lock().unwrap().binds.clone()
    }

    pub(crate) fn destroyed_buffers(&self) -> Vec<BufferId> {
        self.state.lock().unwrap().destroyed_buffers.clone()
    }

    pub(crate) fn destroyed_textures(&self) -> Vec<TextureId> {
        self.state.lock().unwrap().destroyed_textures.clone()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_fence(&self, initial: FenceValue) -> Result<FenceHandle, DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let handle = FenceHandle(state.next_id as u64);
        state.fences.insert(handle, initial);
        Ok(handle)
    }

    fn signal_fence(&self, fence: FenceHandle, value: FenceValue) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if self.auto_complete {
            let completed = state
                .fences
                .get_mut(&fence)
                .ok_or_else(|| DeviceError::Backend(format!("unknown fence {fence:?}")))?;
            *completed = (*completed).max(value);
        } else if !state.fences.contains_key(&fence) {
            return Err(DeviceError::Backend(format!("unknown fence {fence:?}")));
        }
        Ok(())
    }

    fn fence_value(&self, fence: FenceHandle) -> Result<FenceValue, DeviceError> {
        let state = self.state.lock().unwrap();
        state
            .fences
            .get(&fence)
            .copied()
            .ok_or_else(|| DeviceError::Backend(format!("unknown fence {fence:?}")))
    }

    fn wait_fence(
        &self,
        fence: FenceHandle,
        value: FenceValue,
        timeout: Duration,
    ) -> Result<FenceValue, DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.waits.push(value);
        let completed = state
            .fences
            .get(&fence)
            .copied()
            .ok_or_else(|| DeviceError::Backend(format!("unknown fence {fence:?}")))?;
        if completed >= value {
            Ok(completed)
        } else {
            Err(FenceError::Timeout {
                target: value,
                completed,
                waited: timeout,
            }
            .into())
        }
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = BufferId(state.next_id);
        state.buffers.insert(
            id,
            BufferEntry {
                bytes: vec![0; descriptor.size as usize],
                usage: descriptor.usage,
            },
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state
            .buffers
            .remove(&id)
            .ok_or_else(|| DeviceError::Backend(format!("unknown buffer {id:?}")))?;
        state.destroyed_buffers.push(id);
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .buffers
            .get_mut(&id)
            .ok_or_else(|| DeviceError::Backend(format!("unknown buffer {id:?}")))?;
        if !entry.usage.contains(BufferUsage::MAP_WRITE) {
            return Err(DeviceError::InvalidUsage(format!(
                "buffer {id:?} was not created with MAP_WRITE"
            )));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > entry.bytes.len() {
            return Err(DeviceError::InvalidUsage(format!(
                "write of {}..{} exceeds buffer {id:?} ({} bytes)",
                start,
                end,
                entry.bytes.len()
            )));
        }
        entry.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, offset: u64, len: u64) -> Result<Vec<u8>, DeviceError> {
        let state = self.state.lock().unwrap();
        let entry = state
            .buffers
            .get(&id)
            .ok_or_else(|| DeviceError::Backend(format!("unknown buffer {id:?}")))?;
        if !entry.usage.intersects(BufferUsage::MAP_READ | BufferUsage::MAP_WRITE) {
            return Err(DeviceError::InvalidUsage(format!(
                "buffer {id:?} is not CPU-mappable"
            )));
        }
        let start = offset as usize;
        let end = start + len as usize;
        if end > entry.bytes.len() {
            return Err(DeviceError::InvalidUsage(format!(
                "read of {}..{} exceeds buffer {id:?} ({} bytes)",
                start,
                end,
                entry.bytes.len()
            )));
        }
        Ok(entry.bytes[start..end].to_vec())
    }

    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = TextureId(state.next_id);
        state.textures.insert(id, ());
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state
            .textures
            .remove(&id)
            .ok_or_else(|| DeviceError::Backend(format!("unknown texture {id:?}")))?;
        state.destroyed_textures.push(id);
        Ok(())
    }

    fn bind_vertex_buffer(
        &self,
        slot: u32,
        buffer: BufferId,
        offset: u64,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
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
        state.binds.push(BindCall::Index {
            buffer,
            format,
            offset,
        });
        Ok(())
    }

    fn bind_texture_unit(&self, unit: u32, texture: TextureId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.binds.push(BindCall::Texture { unit, texture });
        Ok(())
    }

    fn bind_rw_texture_unit(&self, unit: u32, texture: TextureId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.binds.push(BindCall::RwTexture { unit, texture });
        Ok(())
    }

    fn bind_uniform_slice(&self, slot: u32, slice: RawBufferSlice) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.binds.push(BindCall::Uniform { slot, slice });
        Ok(())
    }

    fn adapter_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: "RecordingBackend".to_string(),
            kind: BackendKind::Software,
        }
    }
}
