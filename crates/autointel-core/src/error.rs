use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("record store failure: {0}")]
    Store(#[from] StoreError),

    #[error("report persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("feature worker failed: {0}")]
    Worker(String),
}

/// Failures reading raw records from an external store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("directory listing failed: {0}")]
    Glob(#[from] glob::GlobError),

    #[cfg(feature = "runtime")]
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[cfg(feature = "runtime")]
    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to write report at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("report for run {0} was already persisted")]
    AlreadyPersisted(Uuid),

    #[cfg(feature = "runtime")]
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid TOML: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
