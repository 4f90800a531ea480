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

use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    client::{ClientError, HostdApi},
    errors::CodedError,
    impl_coded_debug,
    metrics::ExporterMetrics,
    projection::{ProjectionError, RevenueProjector},
};

#[derive(Error)]
pub enum RefreshError {
    #[error("Failed to fetch host metrics: {0}")]
    HostMetrics(ClientError),
    #[error("Failed to fetch host settings: {0}")]
    Settings(ClientError),
    #[error("Failed to project revenue: {0}")]
    Projection(#[from] ProjectionError),
}

impl_coded_debug!(RefreshError);

impl CodedError for RefreshError {
    fn code(&self) -> &str {
        match self {
            RefreshError::HostMetrics(_) => "[H-COL-5001]",
            RefreshError::Settings(_) => "[H-COL-5002]",
            RefreshError::Projection(err) => err.code(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cycle ran to completion and all gauges were updated.
    Completed,
    /// Another cycle was still running, nothing was done.
    Skipped,
}

/// Samples a node and publishes the result into [ExporterMetrics].
///
/// A failed cycle leaves whatever it had not yet written untouched, so scrapers keep seeing the
/// previous values. Projection gauges are only written once both the daily and the monthly series
/// are complete.
pub struct Collector<A: ?Sized> {
    api: Arc<A>,
    metrics: Arc<ExporterMetrics>,
    projector: RevenueProjector,
    in_flight: Mutex<()>,
}

impl<A> Collector<A>
where
    A: HostdApi + ?Sized,
{
    pub fn new(api: Arc<A>, metrics: Arc<ExporterMetrics>, projector: RevenueProjector) -> Self {
        Self { api, metrics, projector, in_flight: Mutex::new(()) }
    }

    pub fn metrics(&self) -> &Arc<ExporterMetrics> {
        &self.metrics
    }

    /// Runs one refresh cycle as of now.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        self.refresh_at(Utc::now()).await
    }

    /// Runs one refresh cycle as of `now`, unless another cycle is in flight.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<RefreshOutcome, RefreshError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Previous refresh still in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        tracing::debug!("Refreshing hostd metrics");
        let started = Instant::now();
        let res = self.collect(now).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &res {
            Ok(()) => {
                self.metrics.refresh.record_success(now.timestamp(), elapsed);
                tracing::debug!("Refresh finished in {elapsed:.3}s");
            }
            Err(_) => self.metrics.refresh.record_failure(elapsed),
        }
        res.map(|()| RefreshOutcome::Completed)
    }

    async fn collect(&self, now: DateTime<Utc>) -> Result<(), RefreshError> {
        let host = self.api.metrics(now).await.map_err(RefreshError::HostMetrics)?;
        self.metrics.host.record_metrics(&host);

        let settings = self.api.settings().await.map_err(RefreshError::Settings)?;
        self.metrics.host.record_settings(&settings);

        let projection = self.projector.project(self.api.as_ref(), now).await?;
        self.metrics.projection.record(&projection.daily);
        self.metrics.projection.record(&projection.monthly);

        Ok(())
    }
}
