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

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

pub mod api;
pub mod client;
pub mod collector;
pub mod config;
pub mod currency;
pub mod errors;
pub mod metrics;
pub mod projection;
pub mod refresher;
pub mod server;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    client::HostdClient, collector::Collector, config::Config, metrics::ExporterMetrics,
    projection::RevenueProjector, refresher::RefreshService,
};

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// hostd API address (host:port)
    #[clap(long, env = "HOSTD_ADDRESS", default_value = "127.0.0.1:9980")]
    pub address: String,

    /// hostd API password
    #[clap(long, env = "HOSTD_PASSWD", default_value = "Sia is Awesome", hide_env_values = true)]
    pub password: String,

    /// Port the metrics endpoint listens on
    #[clap(long, env = "EXPORTER_PORT", default_value_t = 8101)]
    pub port: u16,

    /// Refresh interval in minutes
    #[clap(
        long,
        env = "EXPORTER_REFRESH",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub refresh: u64,

    /// Optional TOML config file
    #[clap(long)]
    pub config_file: Option<PathBuf>,

    /// Log in JSON format
    #[clap(long, default_value_t = false)]
    pub log_json: bool,
}

impl Args {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh * 60)
    }
}

/// Run the exporter until Ctrl-C or SIGTERM
pub async fn run(args: &Args) -> Result<()> {
    let config = match &args.config_file {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };

    let client = HostdClient::new(&args.address, &args.password, config.hostd.request_timeout())
        .context("Failed to create hostd client")?
        .with_page_size(config.hostd.contracts_page_size);
    tracing::info!("Using hostd API at {}", client.base_url());

    let days = config.projection.days;
    let months = config.projection.months;
    let metrics = Arc::new(
        ExporterMetrics::new(days, months).context("Failed to register exporter metrics")?,
    );
    let collector = Arc::new(Collector::new(
        Arc::new(client),
        metrics.clone(),
        RevenueProjector::new(days, months),
    ));

    let cancel_token = CancellationToken::new();
    let refresher =
        Arc::new(RefreshService::new(collector, args.refresh_interval(), cancel_token.clone()))
            .spawn();

    let bind_addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {bind_addr}"))?;
    tracing::info!("Metrics endpoint listening on http://{bind_addr}{}", server::METRICS_PATH);

    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    let served = server::serve(listener, metrics, cancel_token.clone()).await;
    cancel_token.cancel();
    refresher.await.context("Refresh service panicked")??;
    served
}
