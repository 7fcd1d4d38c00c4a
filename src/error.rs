// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::collections::TryReserveError;

/// Represents errors that can occur in the hash table
#[derive(Debug)]
pub enum Error {
    /// Bucket array allocation failed
    ///
    /// The top tier needs a contiguous multi-megabyte allocation, so
    /// creation is fallible instead of aborting the process.
    Alloc(TryReserveError),

    /// An entry with an equal key already exists
    ///
    /// The table never overwrites. Remove the existing entry first to
    /// replace its value.
    KeyExists,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TierTableError: {self:?}")
    }
}

impl std::error::Error for Error {}

impl From<TryReserveError> for Error {
    fn from(value: TryReserveError) -> Self {
        Self::Alloc(value)
    }
}

/// Table result
pub type Result<T> = std::result::Result<T, Error>;
