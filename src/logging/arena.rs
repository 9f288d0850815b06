// SPDX-License-Identifier: Apache-2.0 OR MIT
// Fixed-capacity slot arena managed by a free list and a ready list

use super::destination::DestinationMask;
use super::queue::{IndexQueue, Linked, NULL_INDEX};
use super::Severity;
use std::cell::UnsafeCell;
use std::sync::atomic::AtomicU32;

/// Default number of slots
pub const DEFAULT_SLOTS: u32 = 4096;

/// A finished line waiting in the ready list
#[derive(Debug)]
pub struct PendingLine {
    pub severity: Severity,
    /// Sinks this line goes to
    pub routes: DestinationMask,
    pub payload: Box<[u8]>,
}

/// One arena element: list linkage plus an owned payload
pub struct Slot {
    next: AtomicU32,
    line: UnsafeCell<Option<PendingLine>>,
}

impl Linked for Slot {
    #[inline]
    fn next_link(&self) -> &AtomicU32 {
        &self.next
    }
}

/// Slot array shared by a FreeList and a ReadyList.
///
/// A slot index is always in exactly one place: the free list, a producer's
/// hands, the ready list, or a drainer's hands.
pub struct SlotArena {
    slots: Box<[Slot]>,
    free: IndexQueue,
    ready: IndexQueue,
}

// SAFETY: SlotArena is Sync because:
// - Slot payloads are only touched by the thread that popped the index from a
//   queue (exclusive ownership transfer through the lock-free lists)
// - Queue CAS operations use AcqRel, so payload writes made before a push are
//   visible to whoever pops or drains that index
unsafe impl Sync for SlotArena {}
unsafe impl Send for SlotArena {}

impl SlotArena {
    /// Create an arena with `capacity` slots, all on the free list
    ///
    /// # Panics
    /// Panics if capacity is zero
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "arena needs at least one slot");

        let slots: Vec<Slot> = (0..capacity)
            .map(|_| Slot {
                next: AtomicU32::new(NULL_INDEX),
                line: UnsafeCell::new(None),
            })
            .collect();

        let arena = Self {
            slots: slots.into_boxed_slice(),
            free: IndexQueue::new(capacity),
            ready: IndexQueue::new(capacity),
        };
        for idx in 0..capacity {
            arena.free.push(&arena.slots, idx);
        }
        arena
    }

    /// Move a line into a free slot and publish it on the ready list.
    ///
    /// Hands the line back when every slot is in use.
    pub fn publish(&self, line: PendingLine) -> Result<(), PendingLine> {
        let idx = self.free.pop(&self.slots);
        if idx == NULL_INDEX {
            return Err(line);
        }

        // SAFETY: idx came off the free list, so this thread owns the slot
        unsafe {
            *self.slots[idx as usize].line.get() = Some(line);
        }
        self.ready.push(&self.slots, idx);
        Ok(())
    }

    /// Detach every ready line and pass each to `f` in publication order.
    ///
    /// Slots go back to the free list as soon as their line is taken out.
    /// Returns the number of lines handed to `f`.
    pub fn drain_ready<F: FnMut(PendingLine)>(&self, mut f: F) -> usize {
        let first = self.ready.drain(&self.slots);
        let mut count = 0;
        for idx in IndexQueue::chain(&self.slots, first) {
            // SAFETY: idx was detached from the ready list by this call, so
            // no other thread can reach the slot until it is pushed back
            let line = unsafe { (*self.slots[idx as usize].line.get()).take() };
            self.free.push(&self.slots, idx);
            if let Some(line) = line {
                f(line);
                count += 1;
            }
        }
        count
    }

    /// Number of lines waiting to be written
    pub fn ready_len(&self) -> u32 {
        self.ready.len()
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Number of slots available to producers
    pub fn free_len(&self) -> u32 {
        self.free.len()
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Total CAS retries across both lists
    pub fn cas_failures(&self) -> u64 {
        self.free.cas_failures() + self.ready.cas_failures()
    }
}
