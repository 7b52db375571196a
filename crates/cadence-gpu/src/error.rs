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

//! Defines the hierarchy of error types for the frame-pipeline subsystem.
//!
//! None of these errors are recovered locally: allocation exhaustion, fence
//! timeouts and usage errors are all surfaced to the caller as hard failures.
//! The one documented exception is the single drain-and-retry performed by
//! [`Device::allocate_upload`](crate::device::Device::allocate_upload) before
//! it reports exhaustion.

use crate::api::common::FenceValue;
use std::fmt;
use std::time::Duration;

/// An error produced by the transient upload allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// No placement strategy could satisfy the request under the currently
    /// pending (fence-guarded) reservations.
    Exhausted {
        /// The requested allocation size in bytes.
        requested: u64,
        /// The requested alignment.
        align: u64,
        /// The ring buffer's total capacity.
        capacity: u64,
        /// Bytes still reserved by unexpired allocations.
        in_flight: u64,
    },
    /// The request can never fit, regardless of reclamation.
    OversizedRequest {
        /// The requested allocation size in bytes.
        requested: u64,
        /// The ring buffer's total capacity.
        capacity: u64,
    },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Exhausted {
                requested,
                align,
                capacity,
                in_flight,
            } => {
                write!(
                    f,
                    "Upload buffer is full: {requested} bytes (align {align}) do not fit, \
                     {in_flight} of {capacity} bytes are still fence-guarded"
                )
            }
            UploadError::OversizedRequest {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "Upload request of {requested} bytes can never fit a {capacity}-byte ring buffer"
                )
            }
        }
    }
}

impl std::error::Error for UploadError {}

/// An error produced by fence signaling or waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceError {
    /// A blocking wait exceeded its deadline while a completion marker was
    /// still outstanding. Treated as a GPU hang, not retried.
    Timeout {
        /// The fence value that was waited for.
        target: FenceValue,
        /// The highest value confirmed complete when the deadline expired.
        completed: FenceValue,
        /// How long the wait blocked before giving up.
        waited: Duration,
    },
    /// A signal was issued with a value not strictly greater than the last
    /// signaled value. Programmer error.
    NonMonotonicSignal {
        /// The last value that was signaled.
        last: FenceValue,
        /// The offending requested value.
        requested: FenceValue,
    },
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenceError::Timeout {
                target,
                completed,
                waited,
            } => {
                write!(
                    f,
                    "Fence wait for value {target} timed out after {waited:?} (completed: {completed})"
                )
            }
            FenceError::NonMonotonicSignal { last, requested } => {
                write!(
                    f,
                    "Fence signal value {requested} is not greater than the last signaled value {last}"
                )
            }
        }
    }
}

impl std::error::Error for FenceError {}

/// A high-level error that can occur within the device or a graphics backend.
#[derive(Debug)]
pub enum DeviceError {
    /// The transient upload allocator failed.
    Upload(UploadError),
    /// A fence operation failed.
    Fence(FenceError),
    /// A resource was used in a way it was not created for, such as CPU-mapping
    /// a buffer without `MAP_WRITE`. Fails immediately; programmer error.
    InvalidUsage(String),
    /// An error originating from the specific graphics backend implementation.
    Backend(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Upload(err) => write!(f, "Upload allocation failed: {err}"),
            DeviceError::Fence(err) => write!(f, "Fence operation failed: {err}"),
            DeviceError::InvalidUsage(msg) => write!(f, "Invalid resource usage: {msg}"),
            DeviceError::Backend(msg) => write!(f, "Backend-specific error: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::Upload(err) => Some(err),
            DeviceError::Fence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UploadError> for DeviceError {
    fn from(err: UploadError) -> Self {
        DeviceError::Upload(err)
    }
}

impl From<FenceError> for DeviceError {
    fn from(err: FenceError) -> Self {
        DeviceError::Fence(err)
    }
}
