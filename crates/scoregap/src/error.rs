use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoregapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] SourceFormatError),

    #[error("Catalog search error: {0}")]
    Search(#[from] SearchError),

    #[error("Scoring service error: {0}")]
    Fetch(#[from] crate::fetcher::FetchError),

    #[error("Batch error: {0}")]
    Batch(#[from] crate::pipeline::BatchError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid country code '{code}': {reason}")]
    InvalidCountry { code: String, reason: String },

    #[error("Missing credential '{name}': {source}")]
    MissingCredential {
        name: &'static str,
        #[source]
        source: crate::secrets::SecretError,
    },
}

#[derive(Error, Debug)]
pub enum SourceFormatError {
    #[error("Failed to open catalog '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read catalog header: {0}")]
    Header(#[source] csv::Error),

    #[error("Catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid catalog row at line {line}: {message}")]
    InvalidRow { line: u64, message: String },
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{0}")]
    Fetch(#[from] crate::fetcher::FetchError),

    #[error("Failed to encode catalog snapshot: {0}")]
    Encode(#[from] csv::Error),

    #[error("Failed to save catalog snapshot: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to read catalog snapshot: {0}")]
    Snapshot(#[from] SourceFormatError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace '{to}' with '{from}': {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot cut '{path}' back to {expected} bytes: file is only {actual} bytes")]
    TooShort {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

pub type Result<T> = std::result::Result<T, ScoregapError>;
