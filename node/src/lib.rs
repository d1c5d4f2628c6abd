use commonware_runtime::buffer::PoolRef;
use serde::{Deserialize, Serialize};
use std::{
    num::{NonZeroU64, NonZeroUsize},
    str::FromStr,
};
use thiserror::Error;
use tracing::Level;

pub mod application;
pub mod defaults;
pub mod logging;

pub use logging::LogFormat;

/// Configuration for the state machine host.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_partition_prefix")]
    pub partition_prefix: String,
    #[serde(default = "default_mmr_items_per_blob")]
    pub mmr_items_per_blob: u64,
    #[serde(default = "default_mmr_write_buffer")]
    pub mmr_write_buffer: usize,
    #[serde(default = "default_log_items_per_section")]
    pub log_items_per_section: u64,
    #[serde(default = "default_log_write_buffer")]
    pub log_write_buffer: usize,
    #[serde(default = "default_locations_items_per_blob")]
    pub locations_items_per_blob: u64,
    #[serde(default = "default_buffer_pool_page_size")]
    pub buffer_pool_page_size: usize,
    #[serde(default = "default_buffer_pool_capacity")]
    pub buffer_pool_capacity: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config file")]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: usize },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

pub struct ValidatedConfig {
    pub log_level: Level,
    pub log_format: LogFormat,

    pub partition_prefix: String,
    pub mmr_items_per_blob: NonZeroU64,
    pub mmr_write_buffer: NonZeroUsize,
    pub log_items_per_section: NonZeroU64,
    pub log_write_buffer: NonZeroUsize,
    pub locations_items_per_blob: NonZeroU64,
    pub buffer_pool_page_size: NonZeroUsize,
    pub buffer_pool_capacity: NonZeroUsize,
}

fn default_partition_prefix() -> String {
    defaults::DEFAULT_PARTITION_PREFIX.to_string()
}

fn default_mmr_items_per_blob() -> u64 {
    defaults::DEFAULT_MMR_ITEMS_PER_BLOB
}

fn default_mmr_write_buffer() -> usize {
    defaults::DEFAULT_MMR_WRITE_BUFFER
}

fn default_log_items_per_section() -> u64 {
    defaults::DEFAULT_LOG_ITEMS_PER_SECTION
}

fn default_log_write_buffer() -> usize {
    defaults::DEFAULT_LOG_WRITE_BUFFER
}

fn default_locations_items_per_blob() -> u64 {
    defaults::DEFAULT_LOCATIONS_ITEMS_PER_BLOB
}

fn default_buffer_pool_page_size() -> usize {
    defaults::DEFAULT_BUFFER_POOL_PAGE_SIZE
}

fn default_buffer_pool_capacity() -> usize {
    defaults::DEFAULT_BUFFER_POOL_CAPACITY
}

fn nonzero_usize(field: &'static str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or(ConfigError::InvalidNonZero { field, value })
}

fn nonzero_u64(field: &'static str, value: u64) -> Result<NonZeroU64, ConfigError> {
    NonZeroU64::new(value).ok_or(ConfigError::InvalidNonZero { field, value: 0 })
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse { source })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.partition_prefix.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "partition_prefix",
            });
        }
        let mmr_items_per_blob = nonzero_u64("mmr_items_per_blob", self.mmr_items_per_blob)?;
        let mmr_write_buffer = nonzero_usize("mmr_write_buffer", self.mmr_write_buffer)?;
        let log_items_per_section =
            nonzero_u64("log_items_per_section", self.log_items_per_section)?;
        let log_write_buffer = nonzero_usize("log_write_buffer", self.log_write_buffer)?;
        let locations_items_per_blob =
            nonzero_u64("locations_items_per_blob", self.locations_items_per_blob)?;
        let buffer_pool_page_size =
            nonzero_usize("buffer_pool_page_size", self.buffer_pool_page_size)?;
        let buffer_pool_capacity =
            nonzero_usize("buffer_pool_capacity", self.buffer_pool_capacity)?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            log_level,
            log_format: self.log_format,
            partition_prefix: self.partition_prefix,
            mmr_items_per_blob,
            mmr_write_buffer,
            log_items_per_section,
            log_write_buffer,
            locations_items_per_blob,
            buffer_pool_page_size,
            buffer_pool_capacity,
        })
    }
}

impl ValidatedConfig {
    /// Storage settings for [application::Application::init].
    pub fn application_config(&self) -> application::Config {
        application::Config {
            partition_prefix: self.partition_prefix.clone(),
            mmr_items_per_blob: self.mmr_items_per_blob,
            mmr_write_buffer: self.mmr_write_buffer,
            log_items_per_section: self.log_items_per_section,
            log_write_buffer: self.log_write_buffer,
            locations_items_per_blob: self.locations_items_per_blob,
            buffer_pool: PoolRef::new(self.buffer_pool_page_size, self.buffer_pool_capacity),
        }
    }
}
