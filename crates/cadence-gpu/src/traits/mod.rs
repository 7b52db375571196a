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

//! Defines the core architectural traits for the frame-pipeline subsystem.
//!
//! [`GraphicsBackend`] is the seam that decouples the resource lifetime logic
//! from any specific graphics API. Concrete implementations live outside this
//! crate (the `cadence-soft` software backend, future OpenGL/Vulkan backends).

mod backend;

pub use self::backend::GraphicsBackend;
