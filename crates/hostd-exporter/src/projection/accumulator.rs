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

use num_bigint::BigUint;

use crate::{
    api::{Contract, ContractFilter},
    client::{ClientError, HostdApi},
    currency::{ratio_to_f64, HASTINGS_PER_SIACOIN},
};

/// Sums the outstanding revenue of open contracts that expire inside a window.
///
/// Every window starts at the current height, so a wider window always contains a narrower one
/// and the sums grow with the boundary.
pub struct WindowAccumulator<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A> WindowAccumulator<'a, A>
where
    A: HostdApi + ?Sized,
{
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Revenue in siacoins of all active or renewed contracts expiring at or before `boundary`.
    ///
    /// A failed query is returned as an error. It is never treated as an empty window.
    pub async fn revenue_until(&self, boundary: u64) -> Result<f64, ClientError> {
        let filter = ContractFilter::open_expiring_by(boundary);
        let contracts = self.api.contracts(&filter).await?;

        let total = sum_revenue(contracts.iter().filter(|contract| {
            let matches = filter.matches(contract);
            if !matches {
                tracing::warn!(
                    "Ignoring contract {} ({}, expires at {}) outside of window ending at {boundary}",
                    contract.id,
                    contract.status,
                    contract.expiration_height
                );
            }
            matches
        }));

        Ok(ratio_to_f64(&total, &BigUint::from(HASTINGS_PER_SIACOIN)))
    }
}

/// Exact sum in hastings of the usage revenue of `contracts`.
pub(crate) fn sum_revenue<'c>(contracts: impl Iterator<Item = &'c Contract>) -> BigUint {
    contracts
        .flat_map(|c| c.usage.revenue_categories())
        .map(|amount| amount.to_biguint())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{ContractStatus, ContractUsage},
        currency::Currency,
        test_utils::{contract, MockHostd},
    };

    #[tokio::test]
    async fn empty_window_is_zero() {
        let hostd = MockHostd::new(100);
        let acc = WindowAccumulator::new(&hostd);
        assert_eq!(acc.revenue_until(10_000).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn sums_all_revenue_categories() {
        let usage = ContractUsage {
            storage_revenue: Currency::siacoins(1),
            egress_revenue: Currency::siacoins(2),
            ingress_revenue: Currency::siacoins(3),
            rpc_revenue: Currency::siacoins(4),
            risked_collateral: Currency::siacoins(1000),
        };
        let hostd = MockHostd::new(100).with_contracts(vec![Contract {
            id: "c".into(),
            status: ContractStatus::Active,
            expiration_height: 150,
            usage,
        }]);

        let acc = WindowAccumulator::new(&hostd);
        assert_eq!(acc.revenue_until(149).await.unwrap(), 0.0);
        assert_eq!(acc.revenue_until(150).await.unwrap(), 10.0);
    }

    #[tokio::test]
    async fn only_open_contracts_count() {
        let hostd = MockHostd::new(100).with_contracts(vec![
            contract("active", ContractStatus::Active, 120, 5),
            contract("renewed", ContractStatus::Renewed, 130, 7),
            contract("pending", ContractStatus::Pending, 110, 100),
            contract("failed", ContractStatus::Failed, 110, 100),
            contract("successful", ContractStatus::Successful, 110, 100),
            contract("rejected", ContractStatus::Rejected, 110, 100),
        ]);

        let acc = WindowAccumulator::new(&hostd);
        assert_eq!(acc.revenue_until(1_000).await.unwrap(), 12.0);
    }

    #[tokio::test]
    async fn query_failure_propagates() {
        let hostd = MockHostd::new(100)
            .with_contracts(vec![contract("a", ContractStatus::Active, 120, 5)])
            .fail_contracts_query(0);

        let acc = WindowAccumulator::new(&hostd);
        assert!(acc.revenue_until(1_000).await.is_err());
    }

    #[test]
    fn exact_sum_beyond_u128() {
        let big = Currency::new(u128::MAX);
        let c = Contract {
            id: "big".into(),
            status: ContractStatus::Active,
            expiration_height: 1,
            usage: ContractUsage {
                storage_revenue: big,
                egress_revenue: big,
                ..Default::default()
            },
        };
        assert_eq!(sum_revenue([c].iter()), BigUint::from(u128::MAX) * 2u8);
    }
}
