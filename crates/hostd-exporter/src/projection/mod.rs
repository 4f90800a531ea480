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

//! Projection of outstanding contract revenue onto future days and months.
//!
//! A contract pays out the revenue it has accrued when it expires. For each bucket boundary the
//! [WindowAccumulator] totals the revenue of open contracts expiring at or before it, which yields
//! a cumulative series over nested windows. [marginal] then isolates each bucket's share.

pub mod accumulator;
pub mod boundaries;
pub mod differencer;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use accumulator::WindowAccumulator;
pub use boundaries::{BoundaryError, Boundaries, Period, BLOCKS_PER_DAY, BLOCKS_PER_MONTH};
pub use differencer::{marginal, MarginalSeries};

use crate::{
    client::{ClientError, HostdApi},
    errors::CodedError,
    impl_coded_debug,
};

#[derive(Error)]
pub enum ProjectionError {
    #[error("Failed to query the current chain height: {0}")]
    Height(ClientError),
    #[error("Failed to query contracts expiring by {period} boundary {bucket} (height {height}): {source}")]
    Contracts { period: Period, bucket: usize, height: u64, source: ClientError },
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
}

impl_coded_debug!(ProjectionError);

impl CodedError for ProjectionError {
    fn code(&self) -> &str {
        match self {
            ProjectionError::Height(_) => "[H-PRJ-3001]",
            ProjectionError::Contracts { .. } => "[H-PRJ-3002]",
            ProjectionError::Boundary(err) => err.code(),
        }
    }
}

/// Revenue expected per bucket of one period kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodProjection {
    pub boundaries: Boundaries,
    /// `cumulative[k]` is the revenue of contracts expiring by `boundaries.heights[k]`.
    pub cumulative: Vec<f64>,
    pub marginal: MarginalSeries,
}

impl PeriodProjection {
    pub fn period(&self) -> Period {
        self.boundaries.period
    }
}

/// Daily and monthly projections computed from one chain height.
#[derive(Clone, Debug, PartialEq)]
pub struct RevenueProjection {
    pub height: u64,
    pub daily: PeriodProjection,
    pub monthly: PeriodProjection,
}

/// Computes revenue projections for the current day and month plus a fixed number of whole
/// days and months after them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevenueProjector {
    pub days: usize,
    pub months: usize,
}

impl RevenueProjector {
    pub fn new(days: usize, months: usize) -> Self {
        Self { days, months }
    }

    /// Projects revenue as of `now`.
    ///
    /// Queries run one after another. The first failure aborts the whole projection so that no
    /// partial series is ever returned.
    pub async fn project<A>(
        &self,
        api: &A,
        now: DateTime<Utc>,
    ) -> Result<RevenueProjection, ProjectionError>
    where
        A: HostdApi + ?Sized,
    {
        let height = api.consensus_height().await.map_err(ProjectionError::Height)?;
        let daily = project_period(api, Period::Day, height, now, self.days).await?;
        let monthly = project_period(api, Period::Month, height, now, self.months).await?;
        Ok(RevenueProjection { height, daily, monthly })
    }
}

/// Projects revenue over buckets `0..=horizon` of `period`, starting from chain height `height`.
pub async fn project_period<A>(
    api: &A,
    period: Period,
    height: u64,
    now: DateTime<Utc>,
    horizon: usize,
) -> Result<PeriodProjection, ProjectionError>
where
    A: HostdApi + ?Sized,
{
    let boundaries = Boundaries::derive(period, height, now, horizon)?;
    let accumulator = WindowAccumulator::new(api);

    let mut cumulative = Vec::with_capacity(boundaries.len());
    for (bucket, &boundary) in boundaries.heights.iter().enumerate() {
        let revenue = accumulator.revenue_until(boundary).await.map_err(|source| {
            ProjectionError::Contracts { period, bucket, height: boundary, source }
        })?;
        cumulative.push(revenue);
    }

    let marginal = marginal(&cumulative);
    for &bucket in &marginal.negative {
        tracing::warn!(
            "Projected {period} revenue for bucket {bucket} is negative ({}): contracts changed between queries",
            marginal.values[bucket]
        );
    }

    tracing::debug!(
        "Projected {:.4} SC over {} {period} buckets from height {height}",
        marginal.total(),
        marginal.len()
    );
    Ok(PeriodProjection { boundaries, cumulative, marginal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::ContractStatus,
        test_utils::{contract, MockHostd},
    };
    use chrono::TimeZone;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    const HEIGHT: u64 = 10_000;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn day_boundary(k: u64) -> u64 {
        // 12 hours, 72 blocks, are left in the current day at noon.
        HEIGHT + 72 + k * BLOCKS_PER_DAY
    }

    #[tokio::test]
    async fn no_contracts() {
        let hostd = MockHostd::new(HEIGHT);
        let projection = RevenueProjector::new(31, 12).project(&hostd, noon()).await.unwrap();

        assert_eq!(projection.height, HEIGHT);
        assert_eq!(projection.daily.cumulative, vec![0.0; 32]);
        assert_eq!(projection.daily.marginal.values, vec![0.0; 32]);
        assert_eq!(projection.monthly.marginal.values, vec![0.0; 13]);
    }

    #[tokio::test]
    async fn contract_on_a_boundary_lands_in_that_bucket() {
        let hostd = MockHostd::new(HEIGHT).with_contracts(vec![contract(
            "a",
            ContractStatus::Active,
            day_boundary(2),
            12,
        )]);

        let p = project_period(&hostd, Period::Day, HEIGHT, noon(), 9).await.unwrap();
        assert_eq!(&p.cumulative[..4], &[0.0, 0.0, 12.0, 12.0]);
        let mut expected = vec![0.0; 10];
        expected[2] = 12.0;
        assert_eq!(p.marginal.values, expected);
    }

    #[tokio::test]
    async fn two_contracts_conserve_total() {
        let hostd = MockHostd::new(HEIGHT).with_contracts(vec![
            contract("a", ContractStatus::Active, day_boundary(0), 5),
            contract("b", ContractStatus::Renewed, day_boundary(4), 7),
        ]);

        let p = project_period(&hostd, Period::Day, HEIGHT, noon(), 7).await.unwrap();
        let mut expected = vec![0.0; 8];
        expected[0] = 5.0;
        expected[4] = 7.0;
        assert_eq!(p.marginal.values, expected);
        assert_eq!(p.marginal.total(), 12.0);
        assert_eq!(*p.cumulative.last().unwrap(), 12.0);
    }

    #[tokio::test]
    async fn expired_but_unresolved_contracts_fall_into_the_first_bucket() {
        let hostd = MockHostd::new(HEIGHT).with_contracts(vec![contract(
            "late",
            ContractStatus::Active,
            HEIGHT - 10,
            3,
        )]);

        let p = project_period(&hostd, Period::Month, HEIGHT, noon(), 2).await.unwrap();
        assert_eq!(p.marginal.values, vec![3.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn query_per_boundary() {
        let hostd = MockHostd::new(HEIGHT);
        RevenueProjector::new(31, 12).project(&hostd, noon()).await.unwrap();
        assert_eq!(hostd.contract_queries(), 32 + 13);
    }

    #[tokio::test]
    async fn contract_on_the_last_boundary_is_projected() {
        let hostd = MockHostd::new(HEIGHT).with_contracts(vec![contract(
            "a",
            ContractStatus::Active,
            day_boundary(3),
            12,
        )]);

        let p = project_period(&hostd, Period::Day, HEIGHT, noon(), 3).await.unwrap();
        assert_eq!(p.boundaries.heights.last(), Some(&day_boundary(3)));
        assert_eq!(p.marginal.values, vec![0.0, 0.0, 0.0, 12.0]);
        assert_eq!(p.marginal.total(), 12.0);
    }

    #[tokio::test]
    async fn failure_aborts_the_projection() {
        let hostd = MockHostd::new(HEIGHT)
            .with_contracts(vec![contract("a", ContractStatus::Active, day_boundary(0), 5)])
            .fail_contracts_query(1);

        let err = RevenueProjector::new(31, 12).project(&hostd, noon()).await.unwrap_err();
        match err {
            ProjectionError::Contracts { period, bucket, height, .. } => {
                assert_eq!(period, Period::Day);
                assert_eq!(bucket, 1);
                assert_eq!(height, day_boundary(1));
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Nothing is queried after the failing boundary.
        assert_eq!(hostd.contract_queries(), 2);
    }

    #[tokio::test]
    async fn height_failure() {
        let hostd = MockHostd::new(HEIGHT).fail_height();
        let err = RevenueProjector::new(31, 12).project(&hostd, noon()).await.unwrap_err();
        assert!(matches!(err, ProjectionError::Height(_)));
        assert!(format!("{err:?}").starts_with("[H-PRJ-3001]"));
        assert_eq!(hostd.contract_queries(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn shrinking_snapshot_is_reported() {
        // The contract disappears after the first query, as if it had been resolved mid-cycle.
        let hostd = MockHostd::new(HEIGHT)
            .with_contracts(vec![contract("a", ContractStatus::Active, day_boundary(0), 5)])
            .remove_contracts_after(1);

        let p = project_period(&hostd, Period::Day, HEIGHT, noon(), 2).await.unwrap();
        assert_eq!(p.marginal.values, vec![5.0, -5.0, 0.0]);
        assert_eq!(p.marginal.negative, vec![1]);
        assert!(logs_contain("Projected day revenue for bucket 1 is negative"));
    }

    proptest! {
        #[test]
        fn static_snapshot_properties(
            contracts in prop::collection::vec((0u64..20 * BLOCKS_PER_DAY, 0u64..1_000), 0..40)
        ) {
            let contracts = contracts
                .into_iter()
                .enumerate()
                .map(|(i, (offset, coins))| {
                    contract(&format!("c{i}"), ContractStatus::Active, HEIGHT + offset, coins)
                })
                .collect();
            let hostd = MockHostd::new(HEIGHT).with_contracts(contracts);

            let rt = tokio::runtime::Runtime::new().unwrap();
            let p = rt.block_on(project_period(&hostd, Period::Day, HEIGHT, noon(), 20)).unwrap();

            prop_assert!(p.cumulative.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(p.marginal.values.iter().all(|v| *v >= 0.0));
            prop_assert!(p.marginal.negative.is_empty());
            let last = *p.cumulative.last().unwrap();
            prop_assert!((p.marginal.total() - last).abs() <= 1e-9 * last.max(1.0));
        }
    }
}
