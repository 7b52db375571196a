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

//! Converts per-draw-call resource arguments into backend bind calls.
//!
//! The binder is a pure consumer of the upload allocator: a
//! [`Bindable::UniformValue`] becomes a ring allocation tagged with the
//! current frame's expiration date, a CPU copy, and a uniform-slice bind.
//! Everything else references resources the caller already owns. The binder
//! never retains a slice past the call.

use crate::api::*;
use crate::device::Device;
use crate::error::DeviceError;
use std::sync::Arc;

/// The closed set of resource kinds a draw call can bind.
///
/// Entries are dispatched strictly in the order given, so callers control the
/// binding order the same way a positional argument list would.
#[derive(Debug, Clone, Copy)]
pub enum Bindable<'a> {
    /// A vertex buffer bound to an input slot.
    VertexBuffer {
        /// Vertex input slot.
        slot: u32,
        /// The buffer to bind.
        buffer: BufferId,
        /// Byte offset of the first vertex.
        offset: u64,
    },
    /// The index buffer for indexed draws.
    IndexBuffer {
        /// The buffer to bind.
        buffer: BufferId,
        /// Element type of the indices.
        format: IndexFormat,
        /// Byte offset of the first index.
        offset: u64,
    },
    /// A texture sampled by shaders.
    TextureUnit {
        /// Texture unit index.
        unit: u32,
        /// The texture to bind.
        texture: TextureId,
    },
    /// A texture with shader read/write access.
    RwTextureUnit {
        /// Image unit index.
        unit: u32,
        /// The texture to bind.
        texture: TextureId,
    },
    /// An already-allocated transient range bound as a uniform buffer.
    UniformSlice {
        /// Uniform binding slot.
        slot: u32,
        /// The range to bind.
        slice: RawBufferSlice,
    },
    /// A value uploaded per draw call through the transient allocator.
    UniformValue {
        /// Uniform binding slot.
        slot: u32,
        /// The raw bytes of the value.
        bytes: &'a [u8],
    },
}

impl<'a> Bindable<'a> {
    /// A [`Bindable::UniformValue`] from any POD value, such as a transform
    /// matrix uploaded fresh for each draw call.
    pub fn uniform_value<T: bytemuck::Pod>(slot: u32, value: &'a T) -> Self {
        Bindable::UniformValue {
            slot,
            bytes: bytemuck::bytes_of(value),
        }
    }
}

/// Dispatches every binding in order to the device's backend.
///
/// Stops at the first failing bind and propagates its error; bindings before
/// it have already been issued.
pub fn bind_all(device: &mut Device, bindings: &[Bindable<'_>]) -> Result<(), DeviceError> {
    for binding in bindings {
        bind_one(device, binding)?;
    }
    Ok(())
}

fn bind_one(device: &mut Device, binding: &Bindable<'_>) -> Result<(), DeviceError> {
    match *binding {
        Bindable::VertexBuffer {
            slot,
            buffer,
            offset,
        } => device.backend().bind_vertex_buffer(slot, buffer, offset),
        Bindable::IndexBuffer {
            buffer,
            format,
            offset,
        } => device.backend().bind_index_buffer(buffer, format, offset),
        Bindable::TextureUnit { unit, texture } => {
            device.backend().bind_texture_unit(unit, texture)
        }
        Bindable::RwTextureUnit { unit, texture } => {
            device.backend().bind_rw_texture_unit(unit, texture)
        }
        Bindable::UniformSlice { slot, slice } => {
            device.backend().bind_uniform_slice(slot, slice)
        }
        Bindable::UniformValue { slot, bytes } => {
            let align = device.settings().min_uniform_alignment;
            let slice = device.allocate_upload(bytes.len() as u64, align)?;
            let backend = Arc::clone(device.backend());
            backend.write_buffer(slice.buffer, slice.offset, bytes)?;
            backend.bind_uniform_slice(slot, slice)
        }
    }
}
