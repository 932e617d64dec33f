// src/utils/error.rs
use thiserror::Error;

// Reading the document into pages. Fatal for the run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Could not read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed JSON page list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed XML page export: {0}")]
    Xml(String),

    #[error("Page indices must be contiguous from 0, found {found} at position {position}")]
    NonContiguousIndex { position: usize, found: usize },
}

// Anything that goes wrong talking to the external model. Never leaves the
// heuristic locator: every variant is treated as a negative classification.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Model rate limit exceeded")]
    RateLimited,

    #[error("Model call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Malformed model response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Could not read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate code {code} in standard '{standard}'")]
    DuplicateCode { standard: String, code: String },

    #[error("Catalog contains no disclosures")]
    Empty,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read this document: {0}")]
    Ingest(#[from] IngestError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
