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

//! Client for the hostd HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::{
    api::{ConsensusState, Contract, ContractFilter, ContractsResponse, HostMetrics, HostSettings},
    errors::CodedError,
    impl_coded_debug,
};

/// Default number of contracts requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 500;

#[derive(Error)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Node returned {status} for {url}: {body}")]
    Status { url: String, status: StatusCode, body: String },
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid API address: {0}")]
    InvalidAddress(String),
    #[error("{0}")]
    Other(String),
}

impl_coded_debug!(ClientError);

impl CodedError for ClientError {
    fn code(&self) -> &str {
        match self {
            ClientError::Transport { .. } => "[H-CLI-1001]",
            ClientError::Status { .. } => "[H-CLI-1002]",
            ClientError::Decode { .. } => "[H-CLI-1003]",
            ClientError::InvalidAddress(_) => "[H-CLI-1004]",
            ClientError::Other(_) => "[H-CLI-1500]",
        }
    }
}

/// Read-only view of a storage host node.
#[async_trait]
pub trait HostdApi: Send + Sync {
    /// Height of the current chain tip.
    async fn consensus_height(&self) -> Result<u64, ClientError>;

    /// All contracts matching `filter`. Paging is handled by the implementation; `limit` and
    /// `offset` on the filter are ignored.
    async fn contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>, ClientError>;

    /// Aggregated host metrics at `at`.
    async fn metrics(&self, at: DateTime<Utc>) -> Result<HostMetrics, ClientError>;

    /// Currently announced host settings.
    async fn settings(&self) -> Result<HostSettings, ClientError>;
}

#[derive(Clone, Debug)]
pub struct HostdClient {
    client: Client,
    base_url: Url,
    password: String,
    page_size: u64,
}

impl HostdClient {
    /// Creates a client for the API rooted at `http://{address}/api`.
    pub fn new(address: &str, password: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(&format!("http://{address}/api/"))
            .map_err(|e| ClientError::InvalidAddress(format!("{address}: {e}")))?;
        Self::with_base_url(base_url, password, timeout)
    }

    /// Creates a client for an explicit API root URL.
    pub fn with_base_url(
        mut base_url: Url,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        // Url::join drops the last path segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hostd-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url, password: password.to_string(), page_size: DEFAULT_PAGE_SIZE })
    }

    /// Sets the number of contracts requested per page.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidAddress(format!("{}{path}: {e}", self.base_url)))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<T, ClientError> {
        let response = request
            .basic_auth("", Some(&self.password))
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { url: url.to_string(), status, body });
        }

        response.json().await.map_err(|source| ClientError::Decode { url: url.to_string(), source })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        self.send(self.client.get(url.clone()), &url).await
    }
}

#[async_trait]
impl HostdApi for HostdClient {
    async fn consensus_height(&self) -> Result<u64, ClientError> {
        let state: ConsensusState = self.get(self.url("state/consensus")?).await?;
        Ok(state.index.height)
    }

    async fn contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>, ClientError> {
        let url = self.url("contracts")?;
        let mut contracts = Vec::new();
        let mut offset = 0u64;

        loop {
            let page_filter = ContractFilter {
                limit: Some(self.page_size),
                offset: Some(offset),
                ..filter.clone()
            };
            let page: ContractsResponse =
                self.send(self.client.post(url.clone()).json(&page_filter), &url).await?;

            let received = page.contracts.len() as u64;
            contracts.extend(page.contracts);
            offset += received;

            if received < self.page_size || (page.count > 0 && offset >= page.count) {
                break;
            }
        }

        tracing::trace!(
            "Fetched {} contracts (max expiration {:?})",
            contracts.len(),
            filter.max_expiration_height
        );
        Ok(contracts)
    }

    async fn metrics(&self, at: DateTime<Utc>) -> Result<HostMetrics, ClientError> {
        let mut url = self.url("metrics")?;
        url.query_pairs_mut()
            .append_pair("timestamp", &at.to_rfc3339_opts(SecondsFormat::Secs, true));
        self.get(url).await
    }

    async fn settings(&self) -> Result<HostSettings, ClientError> {
        self.get(self.url("settings")?).await
    }
}
