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

/// Per-bucket amounts recovered from a cumulative series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarginalSeries {
    /// `values[k]` is the amount attributed to bucket `k` alone.
    pub values: Vec<f64>,
    /// Buckets whose amount came out negative, meaning the cumulative input decreased.
    pub negative: Vec<usize>,
}

impl MarginalSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Differences a nearest-to-farthest cumulative series into per-bucket amounts.
///
/// The first bucket keeps its cumulative value and every later bucket gets the increase over its
/// predecessor. The output has one entry per input entry. Negative results are kept as computed
/// and their indices reported.
pub fn marginal(cumulative: &[f64]) -> MarginalSeries {
    let mut values = Vec::with_capacity(cumulative.len());
    let mut negative = Vec::new();
    let mut previous = 0.0;

    for (k, &total) in cumulative.iter().enumerate() {
        let value = total - previous;
        if value < 0.0 {
            negative.push(k);
        }
        values.push(value);
        previous = total;
    }

    MarginalSeries { values, negative }
}
