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

//! Backend-agnostic data structures of the GPU API surface.

pub mod buffer;
pub mod common;
pub mod settings;
pub mod slice;
pub mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::{AdapterInfo, BackendKind, BufferId, FenceHandle, FenceValue, IndexFormat, TextureId};
pub use settings::{DeviceSettings, DEFAULT_MAX_FRAMES_IN_FLIGHT, MIN_UNIFORM_ALIGNMENT};
pub use slice::RawBufferSlice;
pub use texture::{TextureDescriptor, TextureUsage};
