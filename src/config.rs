//! Simulator configuration

use crate::graph::DEFAULT_MAX_VERTICES;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid packet size range: {min} > {max}")]
    PacketSizeRange { min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Fixed seed for the routing random source; `None` draws from entropy
    pub seed: Option<u64>,
    /// Smallest simulated packet, in bytes
    pub packet_size_min: u32,
    /// Largest simulated packet, in bytes (inclusive)
    pub packet_size_max: u32,
    /// Vertex cap for the graph editor; `None` for unlimited
    pub max_vertices: Option<usize>,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            packet_size_min: 100,
            packet_size_max: 1000,
            max_vertices: Some(DEFAULT_MAX_VERTICES),
            log_filter: "info".to_string(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packet_size_min > self.packet_size_max {
            return Err(ConfigError::PacketSizeRange {
                min: self.packet_size_min,
                max: self.packet_size_max,
            });
        }
        Ok(())
    }

    pub fn packet_sizes(&self) -> RangeInclusive<u32> {
        self.packet_size_min..=self.packet_size_max
    }
}
