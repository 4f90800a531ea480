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

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{client::DEFAULT_PAGE_SIZE, errors::CodedError, impl_coded_debug};

/// Upper bound on the day horizon: a year, leap day included.
pub const MAX_DAYS: usize = 366;
/// Upper bound on the month horizon: ten years.
pub const MAX_MONTHS: usize = 120;

#[derive(Error)]
pub enum ConfigErr {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl_coded_debug!(ConfigErr);

impl CodedError for ConfigErr {
    fn code(&self) -> &str {
        match self {
            ConfigErr::InvalidConfig(_) => "[H-CON-4001]",
        }
    }
}

mod defaults {
    pub const fn request_timeout_secs() -> u64 {
        30
    }

    pub const fn contracts_page_size() -> u64 {
        super::DEFAULT_PAGE_SIZE
    }

    pub const fn days() -> usize {
        90
    }

    pub const fn months() -> usize {
        12
    }
}

/// Node API client settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostdConfig {
    /// Timeout applied to every API request, in seconds
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Contracts requested per page when listing contracts
    #[serde(default = "defaults::contracts_page_size")]
    pub contracts_page_size: u64,
}

impl Default for HostdConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: defaults::request_timeout_secs(),
            contracts_page_size: defaults::contracts_page_size(),
        }
    }
}

impl HostdConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Revenue projection settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectionConfig {
    /// Whole days projected after the current one; buckets `0..=days` are exported
    #[serde(default = "defaults::days")]
    pub days: usize,
    /// Whole months projected after the current one; buckets `0..=months` are exported
    #[serde(default = "defaults::months")]
    pub months: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            days: defaults::days(),
            months: defaults::months(),
        }
    }
}

/// Top level config
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub hostd: HostdConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
}

impl Config {
    /// Load the config from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&data).context("Failed to parse toml file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigErr> {
        if self.hostd.request_timeout_secs == 0 {
            return Err(ConfigErr::InvalidConfig("hostd.request_timeout_secs must be > 0".into()));
        }
        if self.hostd.contracts_page_size == 0 {
            return Err(ConfigErr::InvalidConfig("hostd.contracts_page_size must be > 0".into()));
        }
        if !(1..=MAX_DAYS).contains(&self.projection.days) {
            return Err(ConfigErr::InvalidConfig(format!(
                "projection.days must be within 1..={MAX_DAYS}, got {}",
                self.projection.days
            )));
        }
        if self.projection.months > MAX_MONTHS {
            return Err(ConfigErr::InvalidConfig(format!(
                "projection.months must be at most {MAX_MONTHS}, got {}",
                self.projection.months
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG_TEMPL: &str = r#"
[hostd]
request_timeout_secs = 10
contracts_page_size = 100

[projection]
days = 31
months = 6"#;

    const PARTIAL_CONFIG: &str = r#"
[projection]
days = 7"#;

    const BAD_CONFIG: &str = r#"
[projection]
error = ?"#;

    fn write_config(data: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn config_parser() {
        let file = write_config(CONFIG_TEMPL);
        let config = Config::load(file.path()).await.unwrap();

        assert_eq!(config.hostd.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.hostd.contracts_page_size, 100);
        assert_eq!(config.projection.days, 31);
        assert_eq!(config.projection.months, 6);
    }

    #[tokio::test]
    async fn defaults_fill_missing_keys() {
        let file = write_config(PARTIAL_CONFIG);
        let config = Config::load(file.path()).await.unwrap();

        assert_eq!(config.hostd, HostdConfig::default());
        assert_eq!(config.hostd.request_timeout_secs, 30);
        assert_eq!(config.projection.days, 7);
        assert_eq!(config.projection.months, 12);
    }

    #[tokio::test]
    async fn empty_file_is_default() {
        let file = write_config("");
        assert_eq!(Config::load(file.path()).await.unwrap(), Config::default());
    }

    #[tokio::test]
    #[should_panic(expected = "Failed to parse toml file")]
    async fn bad_config() {
        let file = write_config(BAD_CONFIG);
        Config::load(file.path()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file() {
        let err = Config::load(Path::new("/nonexistent/hostd-exporter.toml")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.projection.days = 0;
        assert!(config.validate().is_err());
        config.projection.days = MAX_DAYS + 1;
        assert!(config.validate().is_err());
        config.projection.days = MAX_DAYS;
        assert!(config.validate().is_ok());

        config.projection.months = 0;
        assert!(config.validate().is_ok());
        config.projection.months = MAX_MONTHS + 1;
        let err = config.validate().unwrap_err();
        assert!(format!("{err:?}").starts_with("[H-CON-4001]"));

        let mut config = Config::default();
        config.hostd.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
