//! Error types for the lineage-hook crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid lineage input: {0}")]
    Input(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HookError>;
