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

//! Minimal texture data structures, enough for the binding surface.

use crate::gpu_bitflags;
use std::borrow::Cow;

gpu_bitflags! {
    /// A set of flags describing the allowed usages of a texture.
    pub struct TextureUsage: u32 {
        /// The texture can be sampled in a shader.
        const SAMPLED = 1 << 0;
        /// The texture can be read and written from a shader.
        const STORAGE = 1 << 1;
        /// The texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 2;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 3;
    }
}

/// A descriptor used to create a texture.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label for the texture.
    pub label: Option<Cow<'a, str>>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// A bitmask of [`TextureUsage`] flags describing how the texture will be used.
    pub usage: TextureUsage,
}
