//! Client configuration: where downloads land and what peer ID to announce
//! under.
//!
//! The source this crate's torrent model was distilled from loads this from
//! a viper-backed YAML file (`original_source/config/config.go`). This crate
//! keeps the same defaults-with-optional-override shape but reads a small
//! TOML file via `serde`, matching how the rest of this crate already leans
//! on `serde` rather than a bespoke parser.
use crate::tracker;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not determine the user's home directory")]
    NoHomeDir,

    #[error("peer ID generation failed: {0}")]
    PeerId(#[from] anyhow::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    download_location: Option<String>,
}

/// Resolved client configuration. `peer_id` is generated fresh for each
/// process rather than persisted, matching `tracker::generate_peer_id`'s use
/// at `Client::new` time.
#[derive(Debug, Clone)]
pub struct Config {
    pub download_location: PathBuf,
    pub peer_id: [u8; 20],
}

impl Config {
    /// Loads configuration from `path`, falling back to `$HOME/Downloads`
    /// for any field the file doesn't set.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&contents)?;
        Self::from_raw(raw)
    }

    /// Default configuration for when no config file is present.
    pub fn default_config() -> ConfigResult<Self> {
        Self::from_raw(RawConfig::default())
    }

    fn from_raw(raw: RawConfig) -> ConfigResult<Self> {
        let download_location = match raw.download_location {
            Some(path) => PathBuf::from(path),
            None => default_download_location()?,
        };
        Ok(Config {
            download_location,
            peer_id: tracker::generate_peer_id()?,
        })
    }
}

fn default_download_location() -> ConfigResult<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_falls_back_to_home_downloads() {
        let config = Config::default_config().unwrap();
        assert!(config.download_location.ends_with("Downloads"));
        assert_eq!(config.peer_id.len(), 20);
    }

    #[test]
    fn from_raw_honors_an_explicit_download_location() {
        let raw = RawConfig {
            download_location: Some("/tmp/my-torrents".to_string()),
        };
        let config = Config::from_raw(raw).unwrap();
        assert_eq!(config.download_location, PathBuf::from("/tmp/my-torrents"));
    }
}
