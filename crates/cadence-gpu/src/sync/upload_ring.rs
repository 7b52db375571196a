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

//! The transient upload ring-buffer allocator.
//!
//! A fixed-size circular byte arena that hands out aligned, contiguous
//! ranges of a CPU-writable GPU buffer. Every allocation is tagged with the
//! fence value at which it becomes safe to overwrite; a FIFO queue of
//! [`FencedRegion`]s tracks the outstanding ranges until
//! [`reclaim`](UploadRingBuffer::reclaim) returns them to the free pool.
//!
//! The allocator itself never blocks and never talks to the backend: it is
//! pure circular-buffer arithmetic over `(head, tail, used)`. Backpressure
//! lives in the frame pacer, which bounds how many frames' worth of regions
//! can be pending at once.

use crate::api::common::{BufferId, FenceValue};
use crate::api::slice::RawBufferSlice;
use crate::error::UploadError;
use std::collections::VecDeque;

/// A byte range of the ring buffer that must not be reused before the fence
/// reaches `expires`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedRegion {
    /// The fence value at which the range becomes reclaimable.
    pub expires: FenceValue,
    /// Inclusive start offset of the range.
    pub begin: u64,
    /// Exclusive end offset of the range.
    pub end: u64,
}

impl FencedRegion {
    /// The length of the range in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// A fixed-capacity circular bump allocator over one CPU-writable buffer.
///
/// Offset bookkeeping:
///
/// - `head` (the write pointer) is where the next allocation is attempted;
/// - `tail` (the begin pointer) is the oldest still-reserved byte;
/// - both live in `[0, capacity]` — the `capacity` endpoint occurs
///   transiently when an allocation or reclaimed region ends exactly at the
///   top of the arena.
///
/// When `tail <= head` the free space is the tail slack `[head, capacity)`
/// plus, after wrapping, the head room `[0, tail)`. When `tail > head` the
/// buffer has wrapped and the only free space is `[head, tail)`. Live ranges
/// never overlap because allocations are only ever placed inside the region
/// proven free by that arithmetic, never taken from the pending queue.
#[derive(Debug)]
pub struct UploadRingBuffer {
    buffer: BufferId,
    capacity: u64,
    head: u64,
    tail: u64,
    used: u64,
    pending: VecDeque<FencedRegion>,
}

fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

impl UploadRingBuffer {
    /// Wraps `buffer` (of `capacity` bytes) as a fresh, empty ring.
    pub fn new(buffer: BufferId, capacity: u64) -> Self {
        Self {
            buffer,
            capacity,
            head: 0,
            tail: 0,
            used: 0,
            pending: VecDeque::new(),
        }
    }

    /// Hands out an aligned `size`-byte range that the fence must reach
    /// `expires` before reusing.
    ///
    /// `align` must be a power of two. Expiration dates must be issued in
    /// non-decreasing order of allocation, which the single monotonic frame
    /// counter guarantees.
    pub fn allocate(
        &mut self,
        size: u64,
        align: u64,
        expires: FenceValue,
    ) -> Result<RawBufferSlice, UploadError> {
        debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
        debug_assert!(
            self.pending.back().map_or(true, |r| r.expires <= expires),
            "expiration dates must be issued in non-decreasing order"
        );

        if size >= self.capacity {
            return Err(UploadError::OversizedRequest {
                requested: size,
                capacity: self.capacity,
            });
        }

        let begin = if self.tail > self.head {
            // Wrapped: live bytes occupy [tail, capacity) and [0, head), so
            // the only candidate placement is [head, tail). There is no
            // second slack region to fall back on.
            let aligned = align_up(self.head, align);
            if aligned + size <= self.tail {
                aligned
            } else {
                return Err(self.exhausted(size, align));
            }
        } else if self.used > 0 && self.tail == self.head {
            // The writer has caught up to the oldest reserved byte; any
            // remaining free bytes sit beyond an unexpired region and are
            // unreachable until a reclaim.
            return Err(self.exhausted(size, align));
        } else {
            // Not wrapped: try the tail slack [head, capacity) first, then
            // restart at offset zero if the request fits in front of the
            // oldest reserved byte. Offset zero is a multiple of any
            // power-of-two alignment, so the wrapped placement needs no
            // padding.
            let aligned = align_up(self.head, align);
            if aligned + size <= self.capacity {
                aligned
            } else if size <= self.tail {
                0
            } else {
                return Err(self.exhausted(size, align));
            }
        };

        self.pending.push_back(FencedRegion {
            expires,
            begin,
            end: begin + size,
        });
        self.head = begin + size;
        self.used += size;

        Ok(RawBufferSlice {
            buffer: self.buffer,
            offset: begin,
            size,
        })
    }

    /// Returns every region whose expiration date has been reached to the
    /// free pool, in FIFO order, and reports the number of bytes freed.
    ///
    /// Precondition (single in-order queue): regions retire strictly in
    /// allocation order, so the queue is ordered by non-decreasing
    /// expiration date. A multi-queue backend completing out of order would
    /// violate this; the debug assertion below is the canary.
    pub fn reclaim(&mut self, date: FenceValue) -> u64 {
        let mut freed = 0u64;
        let mut previous: Option<FenceValue> = None;
        while let Some(&region) = self.pending.front() {
            if region.expires > date {
                break;
            }
            debug_assert!(
                previous.map_or(true, |p| p <= region.expires),
                "fenced regions retired out of submission order"
            );
            previous = Some(region.expires);
            self.pending.pop_front();
            self.tail = region.end;
            self.used -= region.len();
            freed += region.len();
        }
        if freed > 0 {
            log::trace!(
                "upload ring: reclaimed {} bytes up to fence {} ({} still in flight)",
                freed,
                date,
                self.used
            );
        }
        freed
    }

    /// The buffer backing this ring.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Total arena size in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes currently reserved by unexpired allocations. Alignment padding
    /// is not counted.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// The write pointer: where the next allocation is attempted.
    pub fn write_offset(&self) -> u64 {
        self.head
    }

    /// The begin pointer: the oldest still-reserved byte.
    pub fn reclaim_offset(&self) -> u64 {
        self.tail
    }

    /// Number of outstanding fence-guarded regions.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The expiration date of the oldest outstanding region, if any.
    pub fn oldest_expiration(&self) -> Option<FenceValue> {
        self.pending.front().map(|r| r.expires)
    }

    /// Iterates the outstanding fence-guarded regions in FIFO order.
    pub fn pending_regions(&self) -> impl Iterator<Item = &FencedRegion> {
        self.pending.iter()
    }

    fn exhausted(&self, requested: u64, align: u64) -> UploadError {
        log::debug!(
            "upload ring exhausted: {} bytes (align {}) requested, head={} tail={} used={}/{}",
            requested,
            align,
            self.head,
            self.tail,
            self.used,
            self.capacity
        );
        UploadError::Exhausted {
            requested,
            align,
            capacity: self.capacity,
            in_flight: self.used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: u64) -> UploadRingBuffer {
        UploadRingBuffer::new(BufferId(1), capacity)
    }

    /// The reference scenario: capacity 1024, alignment 16.
    #[test]
    fn reference_scenario_walkthrough() {
        let mut ring = ring(1024);

        // Two 300-byte allocations in frame 1.
        let a = ring.allocate(300, 16, 1).unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(ring.write_offset(), 300);

        let b = ring.allocate(300, 16, 1).unwrap();
        assert_eq!(b.offset, 304); // aligned past 300
        assert_eq!(ring.write_offset(), 604);
        assert_eq!(ring.used(), 600);

        // Frame 2: 500 bytes. Tail slack is 420 and the wraparound check
        // (500 <= tail == 0) fails, so the request is rejected.
        let err = ring.allocate(500, 16, 2).unwrap_err();
        assert!(matches!(err, UploadError::Exhausted { requested: 500, .. }));

        // The pacer confirms frame 1 completed and reclaims its regions.
        let freed = ring.reclaim(1);
        assert_eq!(freed, 600);
        assert_eq!(ring.reclaim_offset(), 604);
        assert_eq!(ring.used(), 0);
        assert_eq!(ring.pending_len(), 0);

        // The 500-byte request now succeeds via the wraparound placement.
        let c = ring.allocate(500, 16, 4).unwrap();
        assert_eq!(c.offset, 0);
        assert_eq!(ring.write_offset(), 500);
    }

    #[test]
    fn offsets_honor_requested_alignment() {
        let mut ring = ring(4096);
        for (size, align) in [(3u64, 1u64), (5, 4), (10, 16), (100, 64), (1, 256)] {
            let slice = ring.allocate(size, align, 1).unwrap();
            assert_eq!(
                slice.offset % align,
                0,
                "offset {} not aligned to {}",
                slice.offset,
                align
            );
        }
    }

    #[test]
    fn live_ranges_never_overlap() {
        // Churn through several frames of allocations with interleaved
        // reclaims and verify that no two unexpired ranges ever intersect.
        let mut ring = ring(1024);
        let mut live: Vec<(FenceValue, u64, u64)> = Vec::new();
        let sizes = [48u64, 112, 64, 96, 32, 80, 16, 128];

        for frame in 1u64..=40 {
            for (i, &size) in sizes.iter().enumerate() {
                let align = [1u64, 4, 16, 64][i % 4];
                if let Ok(slice) = ring.allocate(size, align, frame) {
                    let (begin, end) = (slice.offset, slice.end());
                    for &(_, b, e) in &live {
                        assert!(end <= b || begin >= e, "[{begin},{end}) overlaps [{b},{e})");
                    }
                    live.push((frame, begin, end));
                }
            }
            // Retire everything older than two frames, like a pacer with
            // two frames in flight would.
            if frame >= 2 {
                let date = frame - 1;
                ring.reclaim(date);
                live.retain(|&(expires, _, _)| expires > date);
            }
        }
        assert!(ring.pending_len() > 0);
    }

    #[test]
    fn reclaim_pops_exactly_the_expired_prefix() {
        let mut ring = ring(1024);
        ring.allocate(100, 1, 1).unwrap();
        ring.allocate(100, 1, 1).unwrap();
        ring.allocate(100, 1, 2).unwrap();
        ring.allocate(100, 1, 3).unwrap();
        assert_eq!(ring.used(), 400);

        let freed = ring.reclaim(2);
        assert_eq!(freed, 300);
        assert_eq!(ring.used(), 100);
        assert!(ring.pending_regions().all(|r| r.expires > 2));
        assert_eq!(ring.oldest_expiration(), Some(3));

        // Reclaiming an older date again is a no-op.
        assert_eq!(ring.reclaim(2), 0);
    }

    #[test]
    fn oversized_requests_are_always_rejected() {
        let mut ring = ring(256);
        assert!(matches!(
            ring.allocate(256, 1, 1),
            Err(UploadError::OversizedRequest {
                requested: 256,
                capacity: 256
            })
        ));
        assert!(matches!(
            ring.allocate(1000, 1, 1),
            Err(UploadError::OversizedRequest { .. })
        ));
        // One byte under capacity is admissible.
        assert!(ring.allocate(255, 1, 1).is_ok());
    }

    #[test]
    fn wrapped_ring_has_no_fallback_region() {
        let mut ring = ring(1024);
        // Fill [0, 600), retire it, then wrap: head ends up below tail.
        ring.allocate(600, 1, 1).unwrap();
        ring.allocate(400, 1, 2).unwrap();
        ring.reclaim(1);
        assert_eq!(ring.reclaim_offset(), 600);

        let slice = ring.allocate(500, 1, 3).unwrap();
        assert_eq!(slice.offset, 0); // wrapped placement
        assert_eq!(ring.write_offset(), 500);
        assert!(ring.reclaim_offset() > ring.write_offset());

        // Free space is exactly [500, 600); a 100-byte request fits, a
        // 101-byte request must fail rather than fall back anywhere else.
        assert!(matches!(
            ring.allocate(101, 1, 3),
            Err(UploadError::Exhausted { .. })
        ));
        let tight = ring.allocate(100, 1, 3).unwrap();
        assert_eq!(tight.offset, 500);
    }

    #[test]
    fn full_ring_is_not_mistaken_for_empty() {
        let mut ring = ring(1024);
        // Wrap until head catches up with tail while regions are still live.
        ring.allocate(600, 1, 1).unwrap();
        ring.allocate(400, 1, 2).unwrap(); // head = 1000
        ring.reclaim(1); // tail = 600
        ring.allocate(500, 1, 3).unwrap(); // wraps, head = 500
        ring.allocate(100, 1, 3).unwrap(); // head = 600 == tail, used > 0

        assert_eq!(ring.write_offset(), ring.reclaim_offset());
        assert!(ring.used() > 0);
        assert!(matches!(
            ring.allocate(1, 1, 3),
            Err(UploadError::Exhausted { .. })
        ));
    }

    #[test]
    fn exact_tail_fit_reaches_capacity_endpoint() {
        let mut ring = ring(1024);
        ring.allocate(512, 1, 1).unwrap();
        ring.allocate(512, 1, 1).unwrap();
        assert_eq!(ring.write_offset(), 1024);
        assert_eq!(ring.used(), 1024);

        // Nothing reclaimable yet, nothing placeable.
        assert!(matches!(
            ring.allocate(1, 1, 2),
            Err(UploadError::Exhausted { .. })
        ));

        ring.reclaim(1);
        assert_eq!(ring.used(), 0);
        // Drained ring wraps back to offset zero on the next allocation.
        let slice = ring.allocate(700, 1, 2).unwrap();
        assert_eq!(slice.offset, 0);
    }

    #[test]
    fn alignment_padding_is_not_counted_as_used() {
        let mut ring = ring(1024);
        ring.allocate(3, 1, 1).unwrap(); // head = 3
        let b = ring.allocate(8, 256, 1).unwrap();
        assert_eq!(b.offset, 256);
        assert_eq!(ring.used(), 11);
        assert_eq!(ring.write_offset(), 264);

        let freed = ring.reclaim(1);
        assert_eq!(freed, 11);
        assert_eq!(ring.used(), 0);
    }

    #[test]
    fn zero_sized_allocation_is_harmless() {
        let mut ring = ring(64);
        let slice = ring.allocate(0, 16, 1).unwrap();
        assert_eq!(slice.size, 0);
        assert_eq!(ring.used(), 0);
        ring.reclaim(1);
        assert_eq!(ring.pending_len(), 0);
    }
}
