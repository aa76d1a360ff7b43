//! # Error Module
//!
//! User-friendly error types for the thumbnail mender.
//!
//! ## Design Principles
//! - **Never panic** on server data - return errors instead
//! - **Include context** - URLs, task ids, what went wrong
//! - **Handle at the boundary** - errors become operator-facing messages in
//!   the coordinator that detects them and are not re-thrown past it
//! - **Recovery is manual** - nothing here triggers an automatic retry

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MendError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Rebuild error: {0}")]
    Rebuild(#[from] RebuildError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

/// Errors talking to the maintenance server
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid server URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

/// Errors during the comprehensive scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to start the library scan: {source}")]
    Launch {
        #[source]
        source: TransportError,
    },

    #[error("Library scan failed: {message}")]
    Failed { message: String },

    #[error("Scan completed without returning a report")]
    MissingReport,

    #[error("Scan report was malformed: {source}")]
    BadReport {
        #[source]
        source: serde_json::Error,
    },

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors during the thumbnail rebuild
#[derive(Error, Debug)]
pub enum RebuildError {
    #[error("Failed to start the rebuild: {source}")]
    Launch {
        #[source]
        source: TransportError,
    },

    #[error("Rebuild failed: {message}")]
    Failed { message: String },

    #[error("Please select at least one thumbnail size")]
    NoSizesSelected,
}

/// Errors from driving the workflow out of order
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("No scan report is available; run a scan first")]
    NoReport,

    #[error("This action is not available in the {state} step")]
    InvalidState { state: &'static str },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MendError>;
