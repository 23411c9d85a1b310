//! Error types for the keeper.

use std::path::PathBuf;

use poolbook::PoolError;

/// All errors that can occur during a keeper session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("script error: {0}")]
    Script(String),

    #[error("failed to read script file {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse script JSON: {0}")]
    ScriptParse(#[from] serde_json::Error),

    #[error("event log {path}: {source}")]
    Events {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("pool rejected configured holding: {0}")]
    Pool(#[from] PoolError),

    #[error("run aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
