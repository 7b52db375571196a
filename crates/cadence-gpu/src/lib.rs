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

//! # Cadence GPU
//!
//! The GPU frame-pipeline resource lifetime system: a fence abstraction, a
//! bounded frames-in-flight frame pacer, the transient upload ring-buffer
//! allocator backing per-frame uniform/vertex uploads, and the resource
//! binder consuming it.
//!
//! The CPU submits commands asynchronously; the GPU executes them at an
//! unknown future time. The only coordination primitive between the two is a
//! monotonically increasing completion counter, the [`Fence`]. Every
//! transient allocation carries the fence value at which its bytes become
//! safe to overwrite, the frame pacer inside [`Device`] converts confirmed
//! fence progress into reclamation, and the frames-in-flight bound turns the
//! fence into backpressure.
//!
//! Concrete graphics backends implement the [`GraphicsBackend`] trait and
//! live in separate crates (`cadence-soft` ships a software reference
//! backend).

#![warn(missing_docs)]

pub mod api;
pub mod binder;
pub mod device;
pub mod error;
pub mod handle;
pub mod sync;
pub mod traits;

mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use api::*;
pub use binder::{bind_all, Bindable};
pub use device::Device;
pub use error::{DeviceError, FenceError, UploadError};
pub use handle::SharedHandle;
pub use sync::{Fence, FencedRegion, UploadRingBuffer};
pub use traits::GraphicsBackend;
