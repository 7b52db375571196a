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

//! Common, backend-agnostic enums and handle types for the GPU API.

/// The value of a fence: an unsigned 64-bit monotonically increasing
/// completion counter.
///
/// A fence's confirmed-complete value only ever increases. Fence values
/// double as frame expiration dates: a frame with id `n` expires once the
/// fence reaches `n + 1`.
pub type FenceValue = u64;

/// An opaque handle to a backend fence object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceHandle(pub u64);

/// An opaque handle to a GPU buffer resource.
///
/// Returned by [`GraphicsBackend::create_buffer`](crate::traits::GraphicsBackend::create_buffer)
/// and used to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

/// A backend-agnostic representation of a graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// OpenGL API.
    OpenGl,
    /// Vulkan API.
    Vulkan,
    /// A software implementation running on the CPU.
    Software,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

/// Identifying information about the adapter a backend runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// A human-readable adapter name.
    pub name: String,
    /// The graphics API the backend drives.
    pub kind: BackendKind,
}
