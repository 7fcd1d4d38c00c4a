// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Fixed bucket-array geometries.
//!
//! A table's bucket count is chosen once at creation from exactly three
//! supported tiers. Each tier is its own concrete aggregate with the bit
//! width fixed at compile time, and every size-dependent code path resolves
//! with a dense `match` on the variant rather than dynamic dispatch.

use crate::{entry::Entry, hash, Error};
use crossbeam_epoch::Atomic;
use std::sync::atomic::{AtomicU32, Ordering::Relaxed};

pub const TIER_16: u32 = 1 << 4;
pub const TIER_1K: u32 = 1 << 10;
pub const TIER_512K: u32 = 1 << 19;

/// One bucket-array geometry: chain heads plus occupancy counters.
pub(crate) struct TierArray<V, const BITS: u32> {
    heads: Box<[Atomic<Entry<V>>]>,
    counters: Box<[AtomicU32]>,
}

impl<V, const BITS: u32> TierArray<V, BITS> {
    const LEN: usize = 1 << BITS;

    /// Allocates the zeroed geometry.
    ///
    /// The top tier is a multi-megabyte contiguous allocation, so this is
    /// fallible instead of aborting on exhaustion.
    fn create() -> Result<Self, Error> {
        let mut heads = Vec::new();
        heads.try_reserve_exact(Self::LEN)?;
        heads.resize_with(Self::LEN, Atomic::null);

        let mut counters = Vec::new();
        counters.try_reserve_exact(Self::LEN)?;
        counters.resize_with(Self::LEN, || AtomicU32::new(0));

        Ok(Self {
            heads: heads.into_boxed_slice(),
            counters: counters.into_boxed_slice(),
        })
    }

    fn index(&self, digest: u32) -> usize {
        hash::bucket_of(digest, BITS)
    }

    // NOTE: every index is produced by `index` above, masked to LEN
    #[allow(clippy::indexing_slicing)]
    fn head(&self, idx: usize) -> &Atomic<Entry<V>> {
        debug_assert!(idx < Self::LEN);
        &self.heads[idx]
    }

    #[allow(clippy::indexing_slicing)]
    fn counter(&self, idx: usize) -> &AtomicU32 {
        debug_assert!(idx < Self::LEN);
        &self.counters[idx]
    }
}

/// The three concrete geometries a table can be created with.
///
/// A dense enumeration instead of one dynamically-sized structure keeps the
/// smallest tier small and the dispatch branch-predictable.
pub(crate) enum Buckets<V> {
    Tier16(TierArray<V, 4>),
    Tier1k(TierArray<V, 10>),
    Tier512k(TierArray<V, 19>),
}

macro_rules! dispatch {
    ($self:expr, |$tier:ident| $body:expr) => {
        match $self {
            Buckets::Tier16($tier) => $body,
            Buckets::Tier1k($tier) => $body,
            Buckets::Tier512k($tier) => $body,
        }
    };
}

impl<V> Buckets<V> {
    /// Rounds the capacity hint up to the nearest supported tier and
    /// allocates that geometry.
    pub fn create(capacity: u32) -> Result<Self, Error> {
        if capacity <= TIER_16 {
            Ok(Self::Tier16(TierArray::create()?))
        } else if capacity <= TIER_1K {
            Ok(Self::Tier1k(TierArray::create()?))
        } else {
            Ok(Self::Tier512k(TierArray::create()?))
        }
    }

    /// Bucket count of this geometry.
    pub fn len(&self) -> usize {
        match self {
            Self::Tier16(_) => TIER_16 as usize,
            Self::Tier1k(_) => TIER_1K as usize,
            Self::Tier512k(_) => TIER_512K as usize,
        }
    }

    /// Maps a key digest to its bucket index.
    pub fn index(&self, digest: u32) -> usize {
        dispatch!(self, |tier| tier.index(digest))
    }

    /// Chain head of the given bucket.
    pub fn head(&self, idx: usize) -> &Atomic<Entry<V>> {
        dispatch!(self, |tier| tier.head(idx))
    }

    /// Occupancy counter of the given bucket.
    pub fn counter(&self, idx: usize) -> &AtomicU32 {
        dispatch!(self, |tier| tier.counter(idx))
    }

    /// Number of entries currently chained in the given bucket.
    ///
    /// Plain integer read; concurrent mutations may leave it momentarily
    /// stale, which statistics consumers tolerate.
    pub fn occupancy(&self, idx: usize) -> u32 {
        self.counter(idx).load(Relaxed)
    }

    /// Heap bytes owned by the bucket arrays, excluding entries.
    pub fn heap_size(&self) -> usize {
        use std::mem::size_of;

        self.len() * (size_of::<Atomic<Entry<V>>>() + size_of::<AtomicU32>())
    }
}
