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

//! Wire types of the hostd HTTP API consumed by the exporter.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// Size of a storage sector in bytes.
pub const SECTOR_SIZE: u64 = 1 << 22;

/// Lifecycle state of a storage contract as reported by the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Pending,
    Active,
    Renewed,
    Rejected,
    Failed,
    Successful,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 6] = [
        ContractStatus::Pending,
        ContractStatus::Active,
        ContractStatus::Renewed,
        ContractStatus::Rejected,
        ContractStatus::Failed,
        ContractStatus::Successful,
    ];

    /// Contracts in these states still have revenue to realize.
    pub const OPEN: [ContractStatus; 2] = [ContractStatus::Active, ContractStatus::Renewed];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::Active => "active",
            ContractStatus::Renewed => "renewed",
            ContractStatus::Rejected => "rejected",
            ContractStatus::Failed => "failed",
            ContractStatus::Successful => "successful",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revenue a contract has accrued so far.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractUsage {
    #[serde(default, rename = "storage")]
    pub storage_revenue: Currency,
    #[serde(default, rename = "egress")]
    pub egress_revenue: Currency,
    #[serde(default, rename = "ingress")]
    pub ingress_revenue: Currency,
    #[serde(default, rename = "rpc")]
    pub rpc_revenue: Currency,
    #[serde(default)]
    pub risked_collateral: Currency,
}

impl ContractUsage {
    /// The usage based revenue categories. Collateral is not revenue and is excluded.
    pub fn revenue_categories(&self) -> [Currency; 4] {
        [self.storage_revenue, self.egress_revenue, self.ingress_revenue, self.rpc_revenue]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub status: ContractStatus,
    pub expiration_height: u64,
    #[serde(default)]
    pub usage: ContractUsage,
}

/// Query filter for the contract listing endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<ContractStatus>,
    #[serde(default, rename = "maxExpiration", skip_serializing_if = "Option::is_none")]
    pub max_expiration_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl ContractFilter {
    /// Open contracts expiring at or before `height`.
    pub fn open_expiring_by(height: u64) -> Self {
        Self {
            statuses: ContractStatus::OPEN.to_vec(),
            max_expiration_height: Some(height),
            ..Default::default()
        }
    }

    /// Whether `contract` satisfies the status and expiration constraints, ignoring paging.
    pub fn matches(&self, contract: &Contract) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&contract.status))
            && self.max_expiration_height.map_or(true, |max| contract.expiration_height <= max)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ContractsResponse {
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChainIndex {
    pub height: u64,
    #[serde(default)]
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConsensusState {
    pub index: ChainIndex,
}

/// Revenue broken down by category.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Revenue {
    pub rpc: Currency,
    pub storage: Currency,
    pub ingress: Currency,
    pub egress: Currency,
    pub registry_read: Currency,
    pub registry_write: Currency,
}

impl Revenue {
    pub fn categories(&self) -> [(&'static str, Currency); 6] {
        [
            ("rpc", self.rpc),
            ("storage", self.storage),
            ("ingress", self.ingress),
            ("egress", self.egress),
            ("registry_read", self.registry_read),
            ("registry_write", self.registry_write),
        ]
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RevenueMetrics {
    pub potential: Revenue,
    pub earned: Revenue,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractMetrics {
    pub pending: u64,
    pub active: u64,
    pub rejected: u64,
    pub failed: u64,
    pub renewed: u64,
    pub successful: u64,
    pub locked_collateral: Currency,
    pub risked_collateral: Currency,
}

impl ContractMetrics {
    pub fn count(&self, status: ContractStatus) -> u64 {
        match status {
            ContractStatus::Pending => self.pending,
            ContractStatus::Active => self.active,
            ContractStatus::Renewed => self.renewed,
            ContractStatus::Rejected => self.rejected,
            ContractStatus::Failed => self.failed,
            ContractStatus::Successful => self.successful,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageMetrics {
    pub total_sectors: u64,
    pub physical_sectors: u64,
    pub contract_sectors: u64,
    pub temp_sectors: u64,
    pub reads: u64,
    pub writes: u64,
}

impl StorageMetrics {
    pub fn total_bytes(&self) -> u64 {
        self.total_sectors.saturating_mul(SECTOR_SIZE)
    }

    pub fn used_bytes(&self) -> u64 {
        self.physical_sectors.saturating_mul(SECTOR_SIZE)
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.total_sectors.saturating_sub(self.physical_sectors).saturating_mul(SECTOR_SIZE)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataTransfer {
    pub ingress: u64,
    pub egress: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataMetrics {
    pub rhp2: DataTransfer,
    pub rhp3: DataTransfer,
}

impl DataMetrics {
    pub fn ingress(&self) -> u64 {
        self.rhp2.ingress.saturating_add(self.rhp3.ingress)
    }

    pub fn egress(&self) -> u64 {
        self.rhp2.egress.saturating_add(self.rhp3.egress)
    }
}

/// Aggregated host metrics at a point in time.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HostMetrics {
    pub revenue: RevenueMetrics,
    pub contracts: ContractMetrics,
    pub storage: StorageMetrics,
    pub data: DataMetrics,
    pub balance: Currency,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Announced host settings. Prices are in hastings; storage is per byte per block, bandwidth per
/// byte.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSettings {
    pub accepting_contracts: bool,
    pub contract_price: Currency,
    #[serde(rename = "baseRPCPrice")]
    pub base_rpc_price: Currency,
    pub sector_access_price: Currency,
    pub storage_price: Currency,
    pub ingress_price: Currency,
    pub egress_price: Currency,
    pub max_collateral: Currency,
    pub max_contract_duration: u64,
}
