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

use crate::api::*;
use crate::error::DeviceError;
use std::fmt::Debug;
use std::time::Duration;

/// The contract a concrete graphics backend must fulfill.
///
/// The core depends only on this trait, which enables runtime backend
/// selection (OpenGL, Vulkan, a software implementation for tests) and keeps
/// the frame-pipeline logic free of API specifics.
///
/// Two preconditions are assumed of every implementation and not re-verified
/// at runtime:
///
/// - a single in-order command queue: submitted commands complete in
///   submission order, so fence values confirm completion of *everything*
///   submitted before the corresponding signal;
/// - fence values reported by [`fence_value`](GraphicsBackend::fence_value)
///   are monotonic non-decreasing.
pub trait GraphicsBackend: Send + Sync + Debug + 'static {
    // --- Fences ---

    /// Creates a fence whose confirmed-complete value starts at `initial`.
    fn create_fence(&self, initial: FenceValue) -> Result<FenceHandle, DeviceError>;

    /// Inserts a completion marker into the command stream.
    ///
    /// Once the GPU has consumed every command submitted before this call,
    /// the fence's confirmed-complete value becomes at least `value`.
    /// Callers must issue values in strictly increasing order.
    fn signal_fence(&self, fence: FenceHandle, value: FenceValue) -> Result<(), DeviceError>;

    /// Non-blocking poll: returns the highest value confirmed complete.
    fn fence_value(&self, fence: FenceHandle) -> Result<FenceValue, DeviceError>;

    /// Blocks the calling thread until the fence reaches `value` or the
    /// timeout elapses.
    ///
    /// Returns the confirmed-complete value on success. Fails with
    /// [`FenceError::Timeout`](crate::error::FenceError::Timeout) if the
    /// deadline is exceeded while a marker is still outstanding; there is no
    /// cancellation.
    fn wait_fence(
        &self,
        fence: FenceHandle,
        value: FenceValue,
        timeout: Duration,
    ) -> Result<FenceValue, DeviceError>;

    // --- Buffers ---

    /// Creates a new GPU buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, DeviceError>;

    /// Destroys a GPU buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError>;

    /// Copies `data` into the buffer's CPU-visible mapping at `offset`.
    ///
    /// The buffer must have been created with
    /// [`BufferUsage::MAP_WRITE`](crate::api::BufferUsage::MAP_WRITE);
    /// otherwise this fails immediately with
    /// [`DeviceError::InvalidUsage`].
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError>;

    /// Reads `len` bytes back from the buffer's CPU-visible mapping.
    ///
    /// Requires [`BufferUsage::MAP_READ`](crate::api::BufferUsage::MAP_READ)
    /// or [`BufferUsage::MAP_WRITE`](crate::api::BufferUsage::MAP_WRITE).
    fn read_buffer(&self, id: BufferId, offset: u64, len: u64) -> Result<Vec<u8>, DeviceError>;

    // --- Textures ---

    /// Creates a new GPU texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, DeviceError>;

    /// Destroys a GPU texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), DeviceError>;

    // --- Binding ---

    /// Binds a vertex buffer to the given input slot.
    fn bind_vertex_buffer(
        &self,
        slot: u32,
        buffer: BufferId,
        offset: u64,
    ) -> Result<(), DeviceError>;

    /// Binds an index buffer.
    fn bind_index_buffer(
        &self,
        buffer: BufferId,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), DeviceError>;

    /// Binds a texture for sampling at the given texture unit.
    fn bind_texture_unit(&self, unit: u32, texture: TextureId) -> Result<(), DeviceError>;

    /// Binds a texture for shader read/write access at the given image unit.
    fn bind_rw_texture_unit(&self, unit: u32, texture: TextureId) -> Result<(), DeviceError>;

    /// Binds a byte range of a uniform buffer to the given binding slot.
    fn bind_uniform_slice(&self, slot: u32, slice: RawBufferSlice) -> Result<(), DeviceError>;

    // --- Introspection ---

    /// Identifying information about the adapter this backend drives.
    fn adapter_info(&self) -> AdapterInfo;
}
