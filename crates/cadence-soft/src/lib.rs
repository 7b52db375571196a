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

//! # Cadence Soft
//!
//! A CPU-only reference backend for `cadence-gpu`. [`SoftBackend`] keeps real
//! byte storage behind the [`GraphicsBackend`](cadence_gpu::GraphicsBackend)
//! trait and lets tests choose between fences that retire instantly and
//! fences that only advance when told to, which makes frames-in-flight
//! backpressure, exhaustion recovery and timeouts observable without any
//! graphics driver.

#![warn(missing_docs)]

pub mod backend;

pub use backend::{BindCall, SoftBackend};

/// Installs the `env_logger` backend for the `log` facade.
///
/// Safe to call from multiple tests; only the first call takes effect.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
