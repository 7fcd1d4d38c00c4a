// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::Key;
use crossbeam_epoch::Atomic;

/// One table entry: a key, the caller's value handle, and the link to the
/// rest of its bucket chain.
///
/// An entry belongs to exactly one bucket at a time. After unlinking, the
/// allocation stays valid until the epoch grace period has passed, so
/// readers that already hold a reference can finish their traversal.
pub(crate) struct Entry<V> {
    pub key: Key,
    pub value: V,
    pub next: Atomic<Entry<V>>,
}

impl<V> Entry<V> {
    pub fn new(key: Key, value: V) -> Self {
        Self {
            key,
            value,
            next: Atomic::null(),
        }
    }
}
