/// Error types shared across the crate
///
/// Each component owns its own error enum; `Error` is what the capture and
/// view flows hand back to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// A draft record was rejected before anything was written
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("unknown customer type '{0}'")]
    UnknownCustomerType(String),
}

/// Failures of the durable record store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database connection lock was poisoned")]
    LockPoisoned,
}

/// Failures while writing an uploaded image
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to write asset {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read asset directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid image extension '{0}'")]
    InvalidExtension(String),

    #[error("uploaded bytes are not a recognised image: {0}")]
    UnrecognisedImage(#[source] image::ImageError),
}

/// Failures while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// Top-level error returned by the capture and view flows
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("location not available: enable location services or enter coordinates manually")]
    GeolocationUnavailable,
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Sqlite(err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
