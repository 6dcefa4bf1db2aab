// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::buffer::BufferError;
use crate::supervisor::Generation;

#[derive(Error, Debug)]
pub enum RelaunchError {
    #[error("no command given")]
    NoCommand,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("killing process of generation {generation}: {source}")]
    Kill {
        generation: Generation,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RelaunchError>;
