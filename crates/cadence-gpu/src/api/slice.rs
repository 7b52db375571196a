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

//! The byte-range capability handed out by the upload allocator.

use crate::api::common::BufferId;

/// A capability to read or write one specific byte range of a buffer.
///
/// A slice is produced by an allocation from the
/// [`UploadRingBuffer`](crate::sync::UploadRingBuffer), consumed once by the
/// caller (typically memory-copied into immediately) and conceptually dead
/// afterwards. The underlying bytes remain valid only until the allocation's
/// expiration date is reached and the region is reclaimed; holding a slice
/// across frames reads recycled memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBufferSlice {
    /// The buffer backing this range.
    pub buffer: BufferId,
    /// Byte offset of the range within the buffer.
    pub offset: u64,
    /// Length of the range in bytes.
    pub size: u64,
}

impl RawBufferSlice {
    /// The exclusive end offset of the range.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}
