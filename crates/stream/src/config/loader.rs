use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use super::types::{StreamConfigFile, StreamEntry};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No enabled streams in config")]
    NoEnabledStreams,
    #[error("Stream not found: {0}")]
    StreamNotFound(String),
    #[error("Duplicate stream id: {0}")]
    DuplicateStream(String),
}

/// Load stream configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StreamConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: StreamConfigFile = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<StreamConfigFile, ConfigError> {
    let config: StreamConfigFile = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<StreamConfigFile, ConfigError> {
    let default_config = include_str!("stream_config.json");
    load_config_from_str(default_config)
}

impl StreamConfigFile {
    /// Get only enabled streams
    pub fn enabled_streams(&self) -> Vec<&StreamEntry> {
        self.streams.iter().filter(|s| s.enabled).collect()
    }

    /// Get a specific stream by ID
    pub fn get_stream(&self, id: &str) -> Result<&StreamEntry, ConfigError> {
        self.streams
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ConfigError::StreamNotFound(id.to_string()))
    }

    /// Streams belonging to one exchange
    pub fn streams_for(&self, exchange: &str) -> Vec<&StreamEntry> {
        self.streams
            .iter()
            .filter(|s| s.exchange.eq_ignore_ascii_case(exchange))
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for stream in &self.streams {
            if !seen.insert(stream.id.as_str()) {
                return Err(ConfigError::DuplicateStream(stream.id.clone()));
            }
        }
        if self.enabled_streams().is_empty() {
            return Err(ConfigError::NoEnabledStreams);
        }
        Ok(())
    }
}
