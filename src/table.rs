// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{entry::Entry, stats::TableStats, tier::Buckets, Error, Key, Result};
use crossbeam_epoch::{self as epoch, Guard, Owned, Shared};
use std::ops::ControlFlow;
use std::sync::{
    atomic::{
        AtomicUsize,
        Ordering::{Acquire, Relaxed, Release},
    },
    Mutex,
};

/// A fixed-tier concurrent hash table mapping [`Key`]s to value handles.
///
/// The bucket count is decided once by [`Table::with_capacity`] and never
/// changes; entries beyond the tier capacity simply chain. Lookups and
/// traversals never block and may run concurrently with mutations, which
/// are serialized internally.
///
/// Dropping the table reclaims all entries.
///
/// # Examples
///
/// ```
/// use tier_table::{Key, Table};
///
/// let table = Table::with_capacity(16)?;
///
/// table.insert(Key::from_u32(1), 100)?;
/// table.insert(Key::from_u32(2), 200)?;
///
/// assert_eq!(Some(100), table.get(&Key::from_u32(1)));
/// assert_eq!(Some(200), table.remove(&Key::from_u32(2)));
/// assert_eq!(None, table.get(&Key::from_u32(2)));
/// # Ok::<(), tier_table::Error>(())
/// ```
pub struct Table<V> {
    buckets: Buckets<V>,

    /// Running total entry count
    ///
    /// Always equals the sum of per-bucket counters once mutations settle.
    item_count: AtomicUsize,

    /// Serializes mutations; the read paths never touch it
    write_lock: Mutex<()>,
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl<V> std::fmt::Debug for Table<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("buckets", &self.buckets.len())
            .field("items", &self.item_count.load(Relaxed))
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> Table<V> {
    /// Creates a table, rounding `capacity` up to the nearest supported
    /// bucket tier (16, 1 024 or 524 288 buckets).
    ///
    /// # Errors
    ///
    /// Errors if the bucket arrays cannot be allocated.
    pub fn with_capacity(capacity: u32) -> Result<Self> {
        let buckets = Buckets::create(capacity)?;

        log::debug!(
            "Creating v{} table with {} buckets (capacity hint was {capacity})",
            env!("CARGO_PKG_VERSION"),
            buckets.len(),
        );

        Ok(Self {
            buckets,
            item_count: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Relaxed)
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value of the entry with this key, if one exists.
    ///
    /// Never blocks: the bucket chain is walked lock-free under an epoch
    /// guard, so this is safe even against a concurrent removal of the very
    /// key being looked up.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<V> {
        let guard = &epoch::pin();
        self.find(key, guard).map(|entry| entry.value.clone())
    }

    /// Inserts a key-value pair.
    ///
    /// The table never overwrites: inserting a key that is already present
    /// fails and leaves the existing entry untouched. Remove the old entry
    /// first to replace a value.
    ///
    /// The new entry is fully initialized before it is linked into its
    /// bucket, so concurrent readers observe either no entry or a complete
    /// one, never a half-written one.
    ///
    /// # Errors
    ///
    /// Errors if an entry with an equal key already exists.
    pub fn insert(&self, key: Key, value: V) -> Result<()> {
        let _write = self.write_lock.lock().expect("write lock poisoned");
        let guard = &epoch::pin();

        if self.find(&key, guard).is_some() {
            return Err(Error::KeyExists);
        }

        let idx = self.buckets.index(key.digest());
        let head = self.buckets.head(idx);

        let entry = Owned::new(Entry::new(key, value));

        // NOTE: we are the only writer, so the head cannot move under us
        entry.next.store(head.load(Relaxed, guard), Relaxed);
        head.store(entry, Release);

        self.buckets.counter(idx).fetch_add(1, Relaxed);
        self.item_count.fetch_add(1, Relaxed);

        Ok(())
    }

    /// Removes the entry with this key, returning its value.
    ///
    /// The entry is unlinked and the counters drop immediately, but the
    /// allocation is only reclaimed after the current epoch's readers are
    /// done, so a reader that already reached the entry finishes safely.
    ///
    /// Returns `None` if no entry matches.
    pub fn remove(&self, key: &Key) -> Option<V> {
        let _write = self.write_lock.lock().expect("write lock poisoned");
        let guard = &epoch::pin();

        let idx = self.buckets.index(key.digest());

        let mut link = self.buckets.head(idx);
        let mut cur = link.load(Acquire, guard);

        // SAFETY: the chain is traversed under the epoch guard
        while let Some(entry) = unsafe { cur.as_ref() } {
            let next = entry.next.load(Acquire, guard);

            if entry.key == *key {
                let value = entry.value.clone();

                // Unlink before reclaiming: new readers can no longer reach
                // the entry, readers already past the link stay valid until
                // the grace period has elapsed
                link.store(next, Release);

                self.buckets.counter(idx).fetch_sub(1, Relaxed);
                self.item_count.fetch_sub(1, Relaxed);

                // SAFETY: unlinked above, and we hold the only write lock,
                // so nothing can unlink it twice
                unsafe { guard.defer_destroy(cur) };

                return Some(value);
            }

            link = &entry.next;
            cur = next;
        }

        None
    }

    /// Removes every entry, leaving the bucket array in place.
    ///
    /// Follows the same deferred-reclamation discipline as [`Table::remove`],
    /// so readers traversing during the clear finish safely.
    pub fn clear(&self) {
        let _write = self.write_lock.lock().expect("write lock poisoned");
        let guard = &epoch::pin();

        log::trace!("Clearing table with {} entries", self.len());

        for idx in 0..self.buckets.len() {
            let mut cur = self
                .buckets
                .head(idx)
                .swap(Shared::null(), Release, guard);

            // SAFETY: the detached chain stays valid under the epoch guard
            while let Some(entry) = unsafe { cur.as_ref() } {
                let next = entry.next.load(Acquire, guard);

                // SAFETY: detached from the bucket above, unreachable for
                // new readers
                unsafe { guard.defer_destroy(cur) };

                cur = next;
            }

            self.buckets.counter(idx).store(0, Relaxed);
        }

        self.item_count.store(0, Relaxed);
    }

    /// Visits every live entry, bucket-major, each chain front to back.
    ///
    /// The visitor returns [`ControlFlow::Break`] to stop early. Traversal
    /// is read-only and runs lock-free; if a writer is active at the same
    /// time the view is best-effort.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::ControlFlow;
    /// use tier_table::{Key, Table};
    ///
    /// let table = Table::with_capacity(16)?;
    /// table.insert(Key::from_u32(1), "a")?;
    /// table.insert(Key::from_u32(2), "b")?;
    ///
    /// let mut visited = 0;
    ///
    /// table.for_each(|_key, _value| {
    ///     visited += 1;
    ///     ControlFlow::Continue(())
    /// });
    ///
    /// assert_eq!(2, visited);
    /// # Ok::<(), tier_table::Error>(())
    /// ```
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Key, &V) -> ControlFlow<()>,
    {
        let guard = &epoch::pin();

        for idx in 0..self.buckets.len() {
            let mut cur = self.buckets.head(idx).load(Acquire, guard);

            // SAFETY: the chain is traversed under the epoch guard
            while let Some(entry) = unsafe { cur.as_ref() } {
                if visitor(&entry.key, &entry.value).is_break() {
                    return;
                }

                cur = entry.next.load(Acquire, guard);
            }
        }
    }

    /// Returns the entry at `position` in traversal order, if any.
    ///
    /// This is a stateless paging primitive: callers walk the table by
    /// passing increasing positions, with no cursor held open between
    /// calls. If the table mutates between calls, entries may be skipped
    /// or seen twice; there is no snapshot isolation.
    #[must_use]
    pub fn entry_at(&self, position: usize) -> Option<(Key, V)> {
        let mut remaining = position;
        let mut found = None;

        self.for_each(|key, value| {
            if remaining == 0 {
                found = Some((*key, value.clone()));
                ControlFlow::Break(())
            } else {
                remaining -= 1;
                ControlFlow::Continue(())
            }
        });

        found
    }

    /// Collects bucket-occupancy distribution statistics.
    ///
    /// A point-in-time, read-only snapshot. Counters are plain integers, so
    /// a concurrent writer may leave individual samples slightly stale;
    /// that is tolerated rather than synchronized away.
    #[must_use]
    pub fn stats(&self) -> TableStats {
        TableStats::collect(&self.buckets, self.len())
    }

    /// Fixed memory cost of the table itself in bytes.
    ///
    /// Covers the bucket arrays of the chosen tier, not the entries; see
    /// [`Table::entry_footprint`] for the per-entry cost.
    #[must_use]
    pub fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.buckets.heap_size()
    }

    /// Fixed memory cost of one entry in bytes.
    #[must_use]
    pub fn entry_footprint() -> usize {
        std::mem::size_of::<Entry<V>>()
    }

    fn find<'g>(&self, key: &Key, guard: &'g Guard) -> Option<&'g Entry<V>> {
        let idx = self.buckets.index(key.digest());
        let mut cur = self.buckets.head(idx).load(Acquire, guard);

        // SAFETY: the chain is traversed under the epoch guard
        while let Some(entry) = unsafe { cur.as_ref() } {
            if entry.key == *key {
                return Some(entry);
            }

            cur = entry.next.load(Acquire, guard);
        }

        None
    }
}

impl<V> Drop for Table<V> {
    fn drop(&mut self) {
        log::trace!("Dropping table with {} buckets", self.buckets.len());

        // SAFETY: exclusive access, no reader can still be pinned on this
        // table, so the chains are reclaimed right away instead of deferred
        let guard = unsafe { epoch::unprotected() };

        for idx in 0..self.buckets.len() {
            let mut cur = self.buckets.head(idx).load(Relaxed, guard);

            while !cur.is_null() {
                // SAFETY: non-null, and only ever linked into this bucket
                let next = unsafe { cur.deref() }.next.load(Relaxed, guard);

                // SAFETY: unreachable once the walk moves past it
                drop(unsafe { cur.into_owned() });

                cur = next;
            }
        }
    }
}
