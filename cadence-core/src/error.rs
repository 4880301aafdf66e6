//! Error types for cadence-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    #[error("Invalid cadence: {0}")]
    InvalidCadence(String),

    #[error("Invalid pace: {0}")]
    InvalidPace(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Cache(e.to_string())
    }
}
