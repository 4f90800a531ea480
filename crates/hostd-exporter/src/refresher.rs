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

use std::sync::Arc;

use anyhow::Result;
use tokio::{
    task::JoinHandle,
    time::{Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{client::HostdApi, collector::Collector};

/// Drives a [Collector] on a fixed interval until cancelled.
pub struct RefreshService<A: ?Sized> {
    collector: Arc<Collector<A>>,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl<A> RefreshService<A>
where
    A: HostdApi + ?Sized + 'static,
{
    pub fn new(
        collector: Arc<Collector<A>>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self { collector, interval, cancel_token }
    }

    async fn refresh(&self) {
        // A failed cycle, the first one included, is retried on the next tick.
        if let Err(e) = self.collector.refresh().await {
            tracing::error!("Failed to refresh hostd metrics, keeping previous values: {e:?}");
        }
    }

    /// Start the refresh service
    pub fn spawn(self: Arc<Self>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            tracing::info!("Starting hostd refresh service, interval {:?}", self.interval);

            // The first tick completes immediately and performs the initial refresh. Cycles run
            // inline, and a tick scheduled before the previous cycle finished is dropped, so the
            // next cycle waits for the next tick on the original schedule.
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_finished: Option<Instant> = None;

            loop {
                tokio::select! {
                    scheduled = interval.tick() => {
                        if last_finished.is_some_and(|finished| scheduled < finished) {
                            tracing::warn!(
                                "Refresh tick fired while the previous cycle was running, skipping"
                            );
                        } else {
                            self.refresh().await;
                            last_finished = Some(Instant::now());
                        }
                    }
                    _ = self.cancel_token.cancelled() => {
                        tracing::info!("Hostd refresh service shutting down");
                        break;
                    }
                }
            }

            Ok(())
        })
    }
}
