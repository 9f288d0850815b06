// SPDX-License-Identifier: Apache-2.0 OR MIT
// Lock-free index queue (tagged-head LIFO over a caller-owned link array)
//
// The queue stores no elements itself. Each element is an index into a slot
// array owned by the caller; the slot's `next` link threads the list. The head
// packs (index, cookie) into one 64-bit word so that a head value observed
// again after intermediate pushes and pops is distinguishable (ABA).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// End-of-list marker
pub const NULL_INDEX: u32 = u32::MAX;

/// Cache-aligned wrapper to prevent false sharing
#[repr(align(64))]
struct CacheAligned<T>(T);

/// Anything that carries a `next` link usable by [`IndexQueue`]
pub trait Linked {
    fn next_link(&self) -> &AtomicU32;
}

impl Linked for AtomicU32 {
    #[inline]
    fn next_link(&self) -> &AtomicU32 {
        self
    }
}

/// Decoded queue head: (index, cookie)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub index: u32,
    pub cookie: u32,
}

impl Head {
    #[inline]
    const fn pack(self) -> u64 {
        ((self.cookie as u64) << 32) | self.index as u64
    }

    #[inline]
    const fn unpack(raw: u64) -> Self {
        Head {
            index: raw as u32,
            cookie: (raw >> 32) as u32,
        }
    }

    /// Successor head for a CAS, with the cookie bumped
    #[inline]
    const fn advance(self, index: u32) -> Self {
        Head {
            index,
            cookie: self.cookie.wrapping_add(1),
        }
    }
}

/// Lock-free multi-producer multi-consumer LIFO of slot indices
///
/// Push and pop are linearizable; `drain` detaches the whole list in one CAS
/// and hands it back in publication (FIFO) order.
pub struct IndexQueue {
    head: CacheAligned<AtomicU64>,
    live: AtomicU32,
    capacity: u32,
    cas_failures: AtomicU64,
}

impl IndexQueue {
    /// Create an empty queue over a slot array of `capacity` entries
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NULL_INDEX, "capacity collides with NULL_INDEX");
        Self {
            head: CacheAligned(AtomicU64::new(
                Head {
                    index: NULL_INDEX,
                    cookie: 0,
                }
                .pack(),
            )),
            live: AtomicU32::new(0),
            capacity,
            cas_failures: AtomicU64::new(0),
        }
    }

    /// Current head, for diagnostics and tests
    pub fn head(&self) -> Head {
        Head::unpack(self.head.0.load(Ordering::Acquire))
    }

    /// Push `idx`; returns the previous head index.
    ///
    /// The caller guarantees `idx < capacity` and that `idx` is not already
    /// reachable from this queue.
    pub fn push<L: Linked>(&self, slots: &[L], idx: u32) -> u32 {
        debug_assert!(idx < self.capacity, "index {} out of range", idx);

        // Count before publishing so a racing pop never drives `live` below zero
        self.live.fetch_add(1, Ordering::Relaxed);

        let link = slots[idx as usize].next_link();
        let mut current = Head::unpack(self.head.0.load(Ordering::Relaxed));
        loop {
            link.store(current.index, Ordering::Relaxed);
            let next = current.advance(idx);
            match self.head.0.compare_exchange_weak(
                current.pack(),
                next.pack(),
                Ordering::AcqRel,  // Success: publish the link and slot contents
                Ordering::Relaxed, // Failure: retry with the fresh head
            ) {
                Ok(_) => break,
                Err(observed) => {
                    self.cas_failures.fetch_add(1, Ordering::Relaxed);
                    current = Head::unpack(observed);
                }
            }
        }
        current.index
    }

    /// Pop the most recently pushed index, or `NULL_INDEX` when empty
    pub fn pop<L: Linked>(&self, slots: &[L]) -> u32 {
        let mut current = Head::unpack(self.head.0.load(Ordering::Acquire));
        loop {
            if current.index == NULL_INDEX {
                return NULL_INDEX;
            }
            // May read a stale link if another consumer wins the race; the
            // cookie makes the CAS below fail in that case.
            let successor = slots[current.index as usize]
                .next_link()
                .load(Ordering::Relaxed);
            let next = current.advance(successor);
            match self.head.0.compare_exchange_weak(
                current.pack(),
                next.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => {
                    self.cas_failures.fetch_add(1, Ordering::Relaxed);
                    current = Head::unpack(observed);
                }
            }
        }

        self.live.fetch_sub(1, Ordering::Relaxed);
        slots[current.index as usize]
            .next_link()
            .store(NULL_INDEX, Ordering::Relaxed);
        current.index
    }

    /// Detach every queued index at once.
    ///
    /// Returns the head of the detached chain reversed into publication order,
    /// or `NULL_INDEX` when empty. Walk it with [`IndexQueue::chain`].
    pub fn drain<L: Linked>(&self, slots: &[L]) -> u32 {
        let mut current = Head::unpack(self.head.0.load(Ordering::Acquire));
        loop {
            if current.index == NULL_INDEX {
                return NULL_INDEX;
            }
            let empty = current.advance(NULL_INDEX);
            match self.head.0.compare_exchange_weak(
                current.pack(),
                empty.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => {
                    self.cas_failures.fetch_add(1, Ordering::Relaxed);
                    current = Head::unpack(observed);
                }
            }
        }

        // The detached chain is private now: reverse it into FIFO order
        let mut next = current.index;
        let mut last = NULL_INDEX;
        let mut count = 0u32;
        while next != NULL_INDEX {
            let idx = next;
            let link = slots[idx as usize].next_link();
            next = link.load(Ordering::Relaxed);
            link.store(last, Ordering::Relaxed);
            last = idx;
            count += 1;
        }

        self.live.fetch_sub(count, Ordering::Relaxed);
        last
    }

    /// Iterate a detached chain starting at `first`.
    ///
    /// Each link is read before its index is yielded, so the caller may push
    /// the yielded index onto another queue right away.
    pub fn chain<'a, L: Linked>(slots: &'a [L], first: u32) -> Chain<'a, L> {
        Chain {
            slots,
            current: first,
        }
    }

    /// Number of indices currently queued
    pub fn len(&self) -> u32 {
        self.live.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        Head::unpack(self.head.0.load(Ordering::Acquire)).index == NULL_INDEX
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Get number of CAS failures (contention metric)
    pub fn cas_failures(&self) -> u64 {
        self.cas_failures.load(Ordering::Relaxed)
    }
}

/// Iterator over a chain detached by [`IndexQueue::drain`]
pub struct Chain<'a, L> {
    slots: &'a [L],
    current: u32,
}

impl<L: Linked> Iterator for Chain<'_, L> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.current == NULL_INDEX {
            return None;
        }
        let idx = self.current;
        self.current = self.slots[idx as usize].next_link().load(Ordering::Relaxed);
        Some(idx)
    }
}
