// Copyright 2026 Boundless Foundation, Inc.
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

//! Mapping of calendar periods onto future block heights.
//!
//! Only the current period is calendar aware: the time remaining until the end of today (or of
//! this month) in UTC is converted into a block count. Every later period is a fixed number of
//! blocks, [BLOCKS_PER_DAY] or [BLOCKS_PER_MONTH], after the previous one. Months therefore drift
//! from calendar months after the first. Exported values depend on this approximation, so it is
//! kept as is rather than replaced with exact calendar arithmetic.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::{errors::CodedError, impl_coded_debug};

/// Nominal time between blocks.
pub const BLOCK_INTERVAL_SECS: i64 = 600;
pub const BLOCKS_PER_DAY: u64 = 144;
pub const BLOCKS_PER_MONTH: u64 = 30 * BLOCKS_PER_DAY;

#[derive(Error)]
pub enum BoundaryError {
    #[error("Cannot determine the end of the {period} containing {at}")]
    InvalidTime { period: Period, at: DateTime<Utc> },
}

impl_coded_debug!(BoundaryError);

impl CodedError for BoundaryError {
    fn code(&self) -> &str {
        match self {
            BoundaryError::InvalidTime { .. } => "[H-BND-2001]",
        }
    }
}

/// Length of a projection bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Month => "month",
        }
    }

    /// Fixed block count of every period after the current one.
    pub fn blocks(&self) -> u64 {
        match self {
            Period::Day => BLOCKS_PER_DAY,
            Period::Month => BLOCKS_PER_MONTH,
        }
    }

    /// First instant after the period containing `at`, in UTC.
    pub fn end_of_current(&self, at: DateTime<Utc>) -> Result<DateTime<Utc>, BoundaryError> {
        let date = at.date_naive();
        let next_start = match self {
            Period::Day => date.succ_opt(),
            Period::Month => {
                let (year, month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        };

        next_start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or(BoundaryError::InvalidTime { period: *self, at })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a duration into whole blocks, rounding to the nearest block.
pub fn blocks_in(duration: Duration) -> u64 {
    let secs = duration.num_seconds().max(0);
    ((secs + BLOCK_INTERVAL_SECS / 2) / BLOCK_INTERVAL_SECS) as u64
}

/// Block heights ending each bucket of one period kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boundaries {
    pub period: Period,
    /// Blocks left until the end of the current, partial period.
    pub remaining_in_current: u64,
    /// `heights[k]` ends bucket `k`; bucket 0 is the current period, bucket `k` the `k`th whole
    /// period after it.
    pub heights: Vec<u64>,
}

impl Boundaries {
    /// Derives the boundaries of buckets `0..=horizon` from chain height `height` observed at
    /// `now`.
    ///
    /// Bucket `k` ends at `height + remaining + k * period.blocks()`, where `remaining` is the
    /// time until the end of the current period in blocks.
    pub fn derive(
        period: Period,
        height: u64,
        now: DateTime<Utc>,
        horizon: usize,
    ) -> Result<Self, BoundaryError> {
        let end = period.end_of_current(now)?;
        let remaining_in_current = blocks_in(end - now);
        let first = height.saturating_add(remaining_in_current);

        let heights = (0..=horizon as u64)
            .map(|k| first.saturating_add(k.saturating_mul(period.blocks())))
            .collect();

        Ok(Self { period, remaining_in_current, heights })
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}
