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

//! Prometheus gauges published by the exporter.
//!
//! All metrics live in one [ExporterMetrics] value with its own [Registry], created once at
//! startup and handed to the collector and the HTTP endpoint.

use prometheus::{
    core::Collector, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::{
    api::{ContractStatus, HostMetrics, HostSettings},
    projection::{Period, PeriodProjection, BLOCKS_PER_MONTH},
};

const BYTES_PER_TB: u64 = 1_000_000_000_000;

fn register<C>(registry: &Registry, collector: C) -> Result<C, prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
    register(registry, Gauge::new(name, help)?)
}

/// Snapshot of host capacity, bandwidth, collateral, revenue and pricing.
pub struct HostGauges {
    total_storage: Gauge,
    used_storage: Gauge,
    remaining_storage: Gauge,
    ingress: Gauge,
    egress: Gauge,
    locked_collateral: Gauge,
    risked_collateral: Gauge,
    wallet_balance: Gauge,
    contract_count: Gauge,
    contracts: GaugeVec,
    revenue: GaugeVec,
    storage_price: Gauge,
    ingress_price: Gauge,
    egress_price: Gauge,
    contract_price: Gauge,
    base_rpc_price: Gauge,
    sector_access_price: Gauge,
    max_collateral: Gauge,
    accepting_contracts: Gauge,
}

impl HostGauges {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            total_storage: gauge(
                registry,
                "hostd_total_storage",
                "total amount of storage available on the hostd in bytes",
            )?,
            used_storage: gauge(
                registry,
                "hostd_used_storage",
                "total amount of storage used on the hostd in bytes",
            )?,
            remaining_storage: gauge(
                registry,
                "hostd_remaining_storage",
                "amount of storage remaining on the host in bytes",
            )?,
            ingress: gauge(registry, "hostd_ingress", "Total ingress in bytes")?,
            egress: gauge(registry, "hostd_egress", "Total egress in bytes")?,
            locked_collateral: gauge(
                registry,
                "host_locked_collateral",
                "Locked collateral in SC",
            )?,
            risked_collateral: gauge(
                registry,
                "host_risked_collateral",
                "Risked collateral in SC",
            )?,
            wallet_balance: gauge(
                registry,
                "wallet_confirmed_siacoin_balance",
                "Wallet confirmed siacoin balance in SC",
            )?,
            contract_count: gauge(registry, "hostd_contract_count", "number of active contracts")?,
            contracts: register(
                registry,
                GaugeVec::new(
                    Opts::new("hostd_contracts", "number of host contracts by status"),
                    &["status"],
                )?,
            )?,
            revenue: register(
                registry,
                GaugeVec::new(
                    Opts::new("hostd_revenue", "host revenue in SC by state and category"),
                    &["state", "kind"],
                )?,
            )?,
            storage_price: gauge(registry, "hostd_storage_price", "Storage price in SC/TB/month")?,
            ingress_price: gauge(registry, "hostd_ingress_price", "Ingress price in SC/TB")?,
            egress_price: gauge(registry, "hostd_egress_price", "Egress price in SC/TB")?,
            contract_price: gauge(
                registry,
                "hostd_contract_price",
                "Contract formation price in SC",
            )?,
            base_rpc_price: gauge(registry, "hostd_base_rpc_price", "Base RPC price in SC")?,
            sector_access_price: gauge(
                registry,
                "hostd_sector_access_price",
                "Sector access price in SC",
            )?,
            max_collateral: gauge(
                registry,
                "hostd_max_collateral",
                "Maximum collateral per contract in SC",
            )?,
            accepting_contracts: gauge(
                registry,
                "hostd_accepting_contracts",
                "1 if the host accepts new contracts, 0 otherwise",
            )?,
        })
    }

    pub fn record_metrics(&self, metrics: &HostMetrics) {
        self.total_storage.set(metrics.storage.total_bytes() as f64);
        self.used_storage.set(metrics.storage.used_bytes() as f64);
        self.remaining_storage.set(metrics.storage.remaining_bytes() as f64);

        self.ingress.set(metrics.data.ingress() as f64);
        self.egress.set(metrics.data.egress() as f64);

        self.locked_collateral.set(metrics.contracts.locked_collateral.to_siacoins());
        self.risked_collateral.set(metrics.contracts.risked_collateral.to_siacoins());
        self.wallet_balance.set(metrics.balance.to_siacoins());

        self.contract_count.set(metrics.contracts.active as f64);
        for status in ContractStatus::ALL {
            self.contracts
                .with_label_values(&[status.as_str()])
                .set(metrics.contracts.count(status) as f64);
        }

        for (state, revenue) in
            [("potential", &metrics.revenue.potential), ("earned", &metrics.revenue.earned)]
        {
            for (kind, amount) in revenue.categories() {
                self.revenue.with_label_values(&[state, kind]).set(amount.to_siacoins());
            }
        }
    }

    pub fn record_settings(&self, settings: &HostSettings) {
        self.storage_price
            .set(settings.storage_price.to_siacoins_scaled(BYTES_PER_TB * BLOCKS_PER_MONTH));
        self.ingress_price.set(settings.ingress_price.to_siacoins_scaled(BYTES_PER_TB));
        self.egress_price.set(settings.egress_price.to_siacoins_scaled(BYTES_PER_TB));
        self.contract_price.set(settings.contract_price.to_siacoins());
        self.base_rpc_price.set(settings.base_rpc_price.to_siacoins());
        self.sector_access_price.set(settings.sector_access_price.to_siacoins());
        self.max_collateral.set(settings.max_collateral.to_siacoins());
        self.accepting_contracts.set(if settings.accepting_contracts { 1.0 } else { 0.0 });
    }

    pub fn wallet_balance(&self) -> f64 {
        self.wallet_balance.get()
    }

    pub fn total_storage(&self) -> f64 {
        self.total_storage.get()
    }
}

/// One gauge per projection bucket, resolved once from the configured horizons.
///
/// A horizon of `n` days publishes buckets `0..=n`: the current day and the `n` days after it.
pub struct ProjectionGauges {
    daily: Vec<Gauge>,
    monthly: Vec<Gauge>,
    inconsistencies: IntCounterVec,
}

impl ProjectionGauges {
    fn new(registry: &Registry, days: usize, months: usize) -> Result<Self, prometheus::Error> {
        let revenue = register(
            registry,
            GaugeVec::new(
                Opts::new(
                    "hostd_projected_revenue",
                    "Revenue in SC expected from open contracts expiring within each future bucket",
                ),
                &["period", "bucket"],
            )?,
        )?;
        let handles = |period: Period, horizon: usize| -> Vec<Gauge> {
            (0..=horizon)
                .map(|k| revenue.with_label_values(&[period.as_str(), &k.to_string()]))
                .collect()
        };

        Ok(Self {
            daily: handles(Period::Day, days),
            monthly: handles(Period::Month, months),
            inconsistencies: register(
                registry,
                IntCounterVec::new(
                    Opts::new(
                        "hostd_exporter_projection_inconsistencies_total",
                        "Projection buckets that came out negative",
                    ),
                    &["period"],
                )?,
            )?,
        })
    }

    pub fn buckets(&self, period: Period) -> &[Gauge] {
        match period {
            Period::Day => &self.daily,
            Period::Month => &self.monthly,
        }
    }

    /// Current value of bucket `k`.
    pub fn value(&self, period: Period, k: usize) -> Option<f64> {
        self.buckets(period).get(k).map(Gauge::get)
    }

    pub fn values(&self, period: Period) -> Vec<f64> {
        self.buckets(period).iter().map(Gauge::get).collect()
    }

    pub fn inconsistencies(&self, period: Period) -> u64 {
        self.inconsistencies.with_label_values(&[period.as_str()]).get()
    }

    /// Writes every bucket of `projection` into its own gauge.
    pub fn record(&self, projection: &PeriodProjection) {
        let period = projection.period();
        let gauges = self.buckets(period);
        let values = &projection.marginal.values;
        if gauges.len() != values.len() {
            tracing::warn!(
                "Projection has {} {period} buckets but {} gauges are registered",
                values.len(),
                gauges.len()
            );
        }

        for (gauge, value) in gauges.iter().zip(values) {
            gauge.set(*value);
        }
        self.inconsistencies
            .with_label_values(&[period.as_str()])
            .inc_by(projection.marginal.negative.len() as u64);
    }
}

/// Health of the refresh loop itself.
pub struct RefreshMetrics {
    total: IntCounterVec,
    last_success: Gauge,
    duration: Histogram,
}

impl RefreshMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            total: register(
                registry,
                IntCounterVec::new(
                    Opts::new("hostd_exporter_refresh_total", "Refresh cycles by result"),
                    &["result"],
                )?,
            )?,
            last_success: gauge(
                registry,
                "hostd_exporter_last_refresh_timestamp_seconds",
                "Unix time of the last successful refresh",
            )?,
            duration: register(
                registry,
                Histogram::with_opts(
                    HistogramOpts::new(
                        "hostd_exporter_refresh_duration_seconds",
                        "Duration of refresh cycles",
                    )
                    .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
                )?,
            )?,
        })
    }

    pub fn record_success(&self, unix_secs: i64, elapsed_secs: f64) {
        self.total.with_label_values(&["success"]).inc();
        self.last_success.set(unix_secs as f64);
        self.duration.observe(elapsed_secs);
    }

    pub fn record_failure(&self, elapsed_secs: f64) {
        self.total.with_label_values(&["failure"]).inc();
        self.duration.observe(elapsed_secs);
    }

    pub fn successes(&self) -> u64 {
        self.total.with_label_values(&["success"]).get()
    }

    pub fn failures(&self) -> u64 {
        self.total.with_label_values(&["failure"]).get()
    }
}

/// Every metric the exporter publishes.
pub struct ExporterMetrics {
    registry: Registry,
    pub host: HostGauges,
    pub projection: ProjectionGauges,
    pub refresh: RefreshMetrics,
}

impl ExporterMetrics {
    pub fn new(days: usize, months: usize) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        Ok(Self {
            host: HostGauges::new(&registry)?,
            projection: ProjectionGauges::new(&registry, days, months)?,
            refresh: RefreshMetrics::new(&registry)?,
            registry,
        })
    }

    /// Renders all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{ContractMetrics, DataMetrics, DataTransfer, Revenue, RevenueMetrics, StorageMetrics},
        currency::Currency,
        projection::{marginal, Boundaries},
    };
    use chrono::{TimeZone, Utc};

    fn projection(period: Period, cumulative: Vec<f64>) -> PeriodProjection {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let boundaries = Boundaries::derive(period, 0, now, cumulative.len() - 1).unwrap();
        PeriodProjection { boundaries, marginal: marginal(&cumulative), cumulative }
    }

    #[test]
    fn one_gauge_per_bucket() {
        let metrics = ExporterMetrics::new(90, 12).unwrap();
        assert_eq!(metrics.projection.buckets(Period::Day).len(), 91);
        assert_eq!(metrics.projection.buckets(Period::Month).len(), 13);

        let cumulative: Vec<f64> = (1..=91).map(|k| k as f64).collect();
        metrics.projection.record(&projection(Period::Day, cumulative));

        // Every bucket holds its own value, none aliased onto another.
        assert_eq!(metrics.projection.values(Period::Day), vec![1.0; 91]);
        assert_eq!(metrics.projection.values(Period::Month), vec![0.0; 13]);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"hostd_projected_revenue{bucket="80",period="day"} 1"#));
        assert!(text.contains(r#"hostd_projected_revenue{bucket="90",period="day"} 1"#));
        assert!(text.contains(r#"hostd_projected_revenue{bucket="12",period="month"} 0"#));
    }

    #[test]
    fn negative_buckets_are_exported_and_counted() {
        let metrics = ExporterMetrics::new(2, 0).unwrap();
        metrics.projection.record(&projection(Period::Day, vec![5.0, 0.0, 0.0]));
        assert_eq!(metrics.projection.values(Period::Day), vec![5.0, -5.0, 0.0]);
        assert_eq!(metrics.projection.inconsistencies(Period::Day), 1);
        assert_eq!(metrics.projection.inconsistencies(Period::Month), 0);
    }

    #[test]
    fn host_metrics() {
        let metrics = ExporterMetrics::new(1, 1).unwrap();
        let host = HostMetrics {
            storage: StorageMetrics {
                total_sectors: 10,
                physical_sectors: 3,
                ..Default::default()
            },
            data: DataMetrics {
                rhp2: DataTransfer { ingress: 1, egress: 2 },
                rhp3: DataTransfer { ingress: 10, egress: 20 },
            },
            contracts: ContractMetrics {
                active: 4,
                failed: 1,
                locked_collateral: Currency::siacoins(3),
                ..Default::default()
            },
            revenue: RevenueMetrics {
                earned: Revenue { storage: Currency::siacoins(9), ..Default::default() },
                ..Default::default()
            },
            balance: Currency::siacoins(42),
            ..Default::default()
        };
        metrics.host.record_metrics(&host);

        assert_eq!(metrics.host.total_storage(), 10.0 * 4_194_304.0);
        assert_eq!(metrics.host.wallet_balance(), 42.0);
        let text = metrics.encode().unwrap();
        assert!(text.contains("hostd_remaining_storage 29360128"));
        assert!(text.contains("hostd_ingress 11"));
        assert!(text.contains("hostd_egress 22"));
        assert!(text.contains("host_locked_collateral 3"));
        assert!(text.contains("host_risked_collateral 0"));
        assert!(text.contains("hostd_contract_count 4"));
        assert!(text.contains(r#"hostd_contracts{status="failed"} 1"#));
        assert!(text.contains(r#"hostd_revenue{kind="storage",state="earned"} 9"#));
        assert!(text.contains(r#"hostd_revenue{kind="storage",state="potential"} 0"#));
    }

    #[test]
    fn settings_prices() {
        let metrics = ExporterMetrics::new(1, 1).unwrap();
        let settings = HostSettings {
            accepting_contracts: true,
            storage_price: Currency::new(1_000_000),
            egress_price: Currency::new(250_000_000_000),
            contract_price: Currency::siacoins(1),
            ..Default::default()
        };
        metrics.host.record_settings(&settings);

        let text = metrics.encode().unwrap();
        // 1e6 H/B/block * 1e12 B * 4320 blocks = 4.32e21 H
        assert!(text.contains("hostd_storage_price 0.00432"));
        // 2.5e11 H/B * 1e12 B = 2.5e23 H
        assert!(text.contains("hostd_egress_price 0.25"));
        assert!(text.contains("hostd_contract_price 1"));
        assert!(text.contains("hostd_accepting_contracts 1"));
    }

    #[test]
    fn registries_are_independent() {
        // Two contexts in one process must not collide on metric names.
        let a = ExporterMetrics::new(1, 1).unwrap();
        let b = ExporterMetrics::new(1, 1).unwrap();
        a.projection.record(&projection(Period::Month, vec![1.0, 2.0]));
        assert_eq!(a.projection.value(Period::Month, 1), Some(1.0));
        assert_eq!(b.projection.value(Period::Month, 1), Some(0.0));
        assert_eq!(b.projection.value(Period::Month, 2), None);
    }
}
