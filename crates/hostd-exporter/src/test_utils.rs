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

//! In-memory node used by tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    api::{Contract, ContractFilter, ContractStatus, ContractUsage, HostMetrics, HostSettings},
    client::{ClientError, HostdApi},
    currency::Currency,
};

/// Contract whose whole revenue, `coins` siacoins, is storage revenue.
pub fn contract(id: &str, status: ContractStatus, expiration_height: u64, coins: u64) -> Contract {
    Contract {
        id: id.to_string(),
        status,
        expiration_height,
        usage: ContractUsage { storage_revenue: Currency::siacoins(coins), ..Default::default() },
    }
}

#[derive(Default)]
struct MockState {
    height: u64,
    contracts: Vec<Contract>,
    metrics: HostMetrics,
    settings: HostSettings,
    fail_height: bool,
    fail_metrics: bool,
    fail_contracts_query: Option<usize>,
    remove_contracts_after: Option<usize>,
}

/// A [HostdApi] backed by a fixed snapshot, with switches for injecting failures.
///
/// Contract queries are numbered from zero in the order they arrive.
#[derive(Default)]
pub struct MockHostd {
    state: Mutex<MockState>,
    contract_queries: AtomicUsize,
    height_queries: AtomicUsize,
    delay: Option<Duration>,
}

impl MockHostd {
    pub fn new(height: u64) -> Self {
        Self { state: Mutex::new(MockState { height, ..Default::default() }), ..Default::default() }
    }

    pub fn with_contracts(self, contracts: Vec<Contract>) -> Self {
        self.set_contracts(contracts);
        self
    }

    pub fn with_metrics(self, metrics: HostMetrics) -> Self {
        self.update(|s| s.metrics = metrics);
        self
    }

    /// Makes the contract query with the given index fail.
    pub fn fail_contracts_query(self, index: usize) -> Self {
        self.update(|s| s.fail_contracts_query = Some(index));
        self
    }

    /// Empties the contract set once `count` contract queries have been answered.
    pub fn remove_contracts_after(self, count: usize) -> Self {
        self.update(|s| s.remove_contracts_after = Some(count));
        self
    }

    pub fn fail_height(self) -> Self {
        self.update(|s| s.fail_height = true);
        self
    }

    pub fn fail_metrics(self) -> Self {
        self.update(|s| s.fail_metrics = true);
        self
    }

    /// Delays every height query, to keep a refresh in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_contracts(&self, contracts: Vec<Contract>) {
        self.update(|s| s.contracts = contracts);
    }

    pub fn set_failing_contracts_query(&self, index: usize) {
        self.update(|s| s.fail_contracts_query = Some(index));
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        self.update(|s| {
            s.fail_height = false;
            s.fail_metrics = false;
            s.fail_contracts_query = None;
        });
    }

    pub fn contract_queries(&self) -> usize {
        self.contract_queries.load(Ordering::SeqCst)
    }

    pub fn height_queries(&self) -> usize {
        self.height_queries.load(Ordering::SeqCst)
    }

    fn update(&self, f: impl FnOnce(&mut MockState)) {
        self.with_state(f)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }
}

#[async_trait]
impl HostdApi for MockHostd {
    async fn consensus_height(&self) -> Result<u64, ClientError> {
        self.height_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.with_state(|s| {
            if s.fail_height {
                return Err(ClientError::Other("mock height failure".into()));
            }
            Ok(s.height)
        })
    }

    async fn contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>, ClientError> {
        let index = self.contract_queries.fetch_add(1, Ordering::SeqCst);
        self.with_state(|s| {
            if s.fail_contracts_query == Some(index) {
                return Err(ClientError::Other(format!("mock failure of contract query {index}")));
            }
            let contracts = s.contracts.iter().filter(|c| filter.matches(c)).cloned().collect();
            if s.remove_contracts_after.is_some_and(|count| index + 1 >= count) {
                s.contracts.clear();
            }
            Ok(contracts)
        })
    }

    async fn metrics(&self, _at: DateTime<Utc>) -> Result<HostMetrics, ClientError> {
        self.with_state(|s| {
            if s.fail_metrics {
                return Err(ClientError::Other("mock metrics failure".into()));
            }
            Ok(s.metrics.clone())
        })
    }

    async fn settings(&self) -> Result<HostSettings, ClientError> {
        self.with_state(|s| Ok(s.settings.clone()))
    }
}
