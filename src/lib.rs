// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A K.I.S.S. implementation of a fixed-tier, read-optimized concurrent hash table.
//!
//! ##### About
//!
//! This crate exports a [`Table`] that maps a compact fixed-width binary key
//! ([`Key`]) to an opaque value handle.
//!
//! The bucket array is sized once at creation, rounded up to one of three
//! fixed tiers (16, 1 024 or 524 288 buckets), and is never resized.
//! Collisions chain, so the entry count is not bounded by the tier; load
//! skew shows up in [`Table::stats`] instead.
//!
//! Lookups and traversals are lock-free and never block. Mutations publish
//! fully-initialized entries before linking them, and unlinked entries are
//! only reclaimed after an epoch grace period, so an in-flight reader can
//! never observe a dangling entry. Mutations themselves are serialized
//! internally; the design is read-many/write-one. If you need concurrent
//! write throughput, use a sharded map instead.
//!
//! Values are cheap cloneable handles (an `Arc`, an index, a small `Copy`
//! struct). The table never interprets them; their lifetime is the
//! caller's business.
//!
//! ```
//! use tier_table::{Key, Table};
//!
//! let table = Table::with_capacity(1_000)?;
//!
//! table.insert(Key::from_u64(42), "value")?;
//! assert_eq!(Some("value"), table.get(&Key::from_u64(42)));
//! assert_eq!(1, table.len());
//!
//! table.remove(&Key::from_u64(42));
//! assert!(table.is_empty());
//! # Ok::<(), tier_table::Error>(())
//! ```

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod entry;
mod error;
mod hash;
mod key;
mod stats;
mod table;
mod tier;

pub use {
    error::{Error, Result},
    key::Key,
    stats::{TableStats, HISTOGRAM_LEN},
    table::Table,
};
