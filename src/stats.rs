// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::tier::Buckets;
use std::cmp::Ordering;

/// Number of cells in the occupancy histogram.
///
/// Occupancies at or above the top cell saturate into it.
pub const HISTOGRAM_LEN: usize = 25;

/// Fixed-point scale for the mean and standard deviation internals
const PRECISION: u64 = 1000;

/// Bucket-occupancy distribution of a table at one point in time.
///
/// One sample per bucket, so the sample count is the tier size. Mean and
/// standard deviation are computed integer-only, scaled by 1000 internally
/// and truncated back to whole numbers, so a lightly loaded table reports
/// zero for both.
///
/// # Examples
///
/// ```
/// use tier_table::{Key, Table};
///
/// let table = Table::with_capacity(16)?;
///
/// for i in 0..32 {
///     table.insert(Key::from_u64(i), i)?;
/// }
///
/// let stats = table.stats();
///
/// assert_eq!(32, stats.count);
/// assert_eq!(2, stats.mean); // 32 entries over 16 buckets
/// # Ok::<(), tier_table::Error>(())
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableStats {
    /// Total number of entries
    pub count: u32,

    /// Arithmetic mean of per-bucket occupancy, truncated
    pub mean: u64,

    /// Standard deviation of per-bucket occupancy, truncated
    pub std_dev: u64,

    /// Smallest per-bucket occupancy
    pub min: u64,

    /// Number of buckets at the minimum
    pub min_count: u64,

    /// Largest per-bucket occupancy
    pub max: u64,

    /// Number of buckets at the maximum
    pub max_count: u64,

    /// Most frequent occupancy value within the histogram range
    ///
    /// Ties resolve to the smaller occupancy.
    pub mode: u64,

    /// Number of buckets at the mode
    pub mode_count: u64,

    /// Number of buckets in the table
    pub bucket_count: u32,

    /// Histogram axis, `0..25`, for plotting consumers
    pub x_axis: [u32; HISTOGRAM_LEN],

    /// Occupancy histogram; the top cell saturates
    pub histogram: [u32; HISTOGRAM_LEN],
}

impl TableStats {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn collect<V>(buckets: &Buckets<V>, count: usize) -> Self {
        let bucket_count = buckets.len();

        let mut stats = Self {
            count: count as u32,
            bucket_count: bucket_count as u32,
            min: u64::MAX,
            ..Self::default()
        };

        let mut sum: u128 = 0;
        let mut sum_sq: u128 = 0;

        for idx in 0..bucket_count {
            let occupancy = u64::from(buckets.occupancy(idx));

            match occupancy.cmp(&stats.min) {
                Ordering::Less => {
                    stats.min = occupancy;
                    stats.min_count = 1;
                }
                Ordering::Equal => stats.min_count += 1,
                Ordering::Greater => {}
            }

            match occupancy.cmp(&stats.max) {
                Ordering::Greater => {
                    stats.max = occupancy;
                    stats.max_count = 1;
                }
                Ordering::Equal => stats.max_count += 1,
                Ordering::Less => {}
            }

            let cell = (occupancy as usize).min(HISTOGRAM_LEN - 1);
            if let Some(freq) = stats.histogram.get_mut(cell) {
                *freq += 1;
            }

            let scaled = u128::from(occupancy * PRECISION);
            sum += scaled;
            sum_sq += scaled * scaled;
        }

        // Mean of squares minus square of the mean, in scaled integers.
        // The subtraction saturates because both terms truncate on divide.
        let n = bucket_count as u128;
        let mean = sum / n;
        let variance = (sum_sq / n).saturating_sub(mean * mean);

        let std_dev = sqrt(u64::try_from(variance).unwrap_or(u64::MAX));

        stats.mean = u64::try_from(mean).unwrap_or(u64::MAX) / PRECISION;
        stats.std_dev = std_dev / PRECISION;

        for (value, &freq) in stats.histogram.iter().enumerate() {
            if u64::from(freq) > stats.mode_count {
                stats.mode = value as u64;
                stats.mode_count = u64::from(freq);
            }
        }

        for (value, cell) in stats.x_axis.iter_mut().enumerate() {
            *cell = value as u32;
        }

        stats
    }
}

/// Integer square root by monotonic bisection over the 64-bit range.
///
/// Keeps `min * min <= value < max * max` and stops when the interval
/// collapses to width one, so the result is the floor square root.
fn sqrt(value: u64) -> u64 {
    let mut max: u64 = 1 << 32;
    let mut min: u64 = 0;

    loop {
        if max <= min + 1 {
            return min;
        }

        let probe = min + (max - min) / 2;
        let square = probe * probe;

        if square == value {
            return probe;
        }

        if square > value {
            max = probe;
        } else {
            min = probe;
        }
    }
}
