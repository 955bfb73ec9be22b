//! Error types for skyburst

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkyburstError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid hex color: {0} (expected RRGGBB, e.g. 1a1b26)")]
    InvalidColor(String),

    #[error("Audio error: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, SkyburstError>;
