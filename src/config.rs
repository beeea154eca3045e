//! Typed configuration (§6 named options): a serde-derived struct
//! loaded from an optional TOML file and overlaid with explicit
//! builder calls, validated once at load time rather than scattered
//! through the operations that consume it.

use serde::{Deserialize, Serialize};

use crate::error::Status;
use crate::partition::PartitioningMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartitioningTypeConfig {
    RoundRobin,
    TwoGrid,
}

impl From<PartitioningTypeConfig> for PartitioningMethod {
    fn from(value: PartitioningTypeConfig) -> Self {
        match value {
            PartitioningTypeConfig::RoundRobin => PartitioningMethod::RoundRobin,
            PartitioningTypeConfig::TwoGrid => PartitioningMethod::TwoGrid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitioningConfig {
    #[serde(rename = "type")]
    pub method: PartitioningTypeConfig,
    pub dist_ppd: u32,
    pub part_ppd: u32,
    pub batch_size: usize,
}

impl Default for PartitioningConfig {
    fn default() -> Self {
        PartitioningConfig {
            method: PartitioningTypeConfig::RoundRobin,
            dist_ppd: 8,
            part_ppd: 1,
            batch_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprilSectionConfig {
    pub order: u32,
    pub compression: bool,
}

impl Default for AprilSectionConfig {
    fn default() -> Self {
        AprilSectionConfig { order: 16, compression: false }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryConfig {
    pub intermediate_filter: bool,
    pub refinement: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig { intermediate_filter: true, refinement: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub worker_count: u32,
    pub hosts: Vec<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig { worker_count: 1, hosts: vec!["127.0.0.1".into()] }
    }
}

/// The process-wide configuration (§4.8). Loaded from TOML, then
/// overlaid with any explicit overrides, then validated once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub partitioning: PartitioningConfig,
    #[serde(default)]
    pub april: AprilSectionConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, Status> {
        let config: Config = toml::from_str(text).map_err(|e| Status::ConfigInvalidValue {
            key: "<root>".into(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, Status> {
        let text = std::fs::read_to_string(path).map_err(|e| Status::Io(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Apply the §6 range checks, failing closed rather than letting
    /// an invalid value surface as a mysterious downstream error.
    pub fn validate(&self) -> Result<(), Status> {
        if self.partitioning.dist_ppd == 0 {
            return Err(Status::ConfigInvalidValue {
                key: "partitioning.distPPD".into(),
                reason: "must be positive".into(),
            });
        }
        if matches!(self.partitioning.method, PartitioningTypeConfig::TwoGrid) && self.partitioning.part_ppd == 0 {
            return Err(Status::ConfigInvalidValue {
                key: "partitioning.partPPD".into(),
                reason: "must be positive for TWO_GRID".into(),
            });
        }
        if self.partitioning.batch_size == 0 {
            return Err(Status::ConfigInvalidValue {
                key: "partitioning.batchSize".into(),
                reason: "must be positive".into(),
            });
        }
        if !(crate::april::MIN_ORDER..=crate::april::MAX_ORDER).contains(&self.april.order) {
            return Err(Status::ConfigInvalidValue {
                key: "april.N".into(),
                reason: format!("must be in [{}, {}]", crate::april::MIN_ORDER, crate::april::MAX_ORDER),
            });
        }
        if self.april.compression {
            return Err(Status::ConfigInvalidValue {
                key: "april.compression".into(),
                reason: "compressed APRIL sections are not implemented".into(),
            });
        }
        if self.cluster.worker_count == 0 {
            return Err(Status::ConfigInvalidValue {
                key: "cluster.workerCount".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn with_worker_count(mut self, worker_count: u32) -> Self {
        self.cluster.worker_count = worker_count;
        self
    }

    pub fn with_query_options(mut self, intermediate_filter: bool, refinement: bool) -> Self {
        self.query.intermediate_filter = intermediate_filter;
        self.query.refinement = refinement;
        self
    }
}
