//! # Errors
//!
//! Typed errors for each failure domain of the sync pipeline.
//!
//! - [`AuthenticationError`] aborts a whole run.
//! - [`StoreError`] and [`TargetWriteError`] are per-mapping and never abort a run.
//! - [`ConfigurationError`] is fatal at startup.
//! - [`SyncError`] is what a caller of the trigger surface sees.

use thiserror::Error;

/// Vault AppRole handshake failure
#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Vault login request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Vault login rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Vault login response was malformed: {0}")]
    MalformedResponse(String),
}

impl AuthenticationError {
    /// Check if this error is transient (a later run may succeed without config changes)
    pub fn is_transient(&self) -> bool {
        match self {
            AuthenticationError::Transport(_) => true,
            AuthenticationError::Rejected { status, .. } => *status >= 500 || *status == 429,
            AuthenticationError::MalformedResponse(_) => false,
        }
    }
}

/// Failure reading a secret path from the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secret path '{path}' not found")]
    NotFound { path: String },
    #[error("access to secret path '{path}' denied")]
    Authorization { path: String },
    #[error("transport error reading '{path}': {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} reading '{path}': {body}")]
    Unexpected {
        path: String,
        status: u16,
        body: String,
    },
    #[error("malformed response for '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl StoreError {
    /// Short machine-friendly label, used for metrics and per-mapping reports
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Authorization { .. } => "authorization",
            StoreError::Transport { .. } => "transport",
            StoreError::Unexpected { .. } => "store",
            StoreError::Malformed { .. } => "malformed",
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, StoreError::Authorization { .. })
    }
}

/// Failure reading or writing a target Secret object
#[derive(Debug, Error)]
pub enum TargetWriteError {
    #[error("failed to read secret {namespace}/{name}: {reason}")]
    Lookup {
        namespace: String,
        name: String,
        reason: String,
    },
    #[error("failed to create secret {namespace}/{name}: {reason}")]
    Create {
        namespace: String,
        name: String,
        reason: String,
    },
    #[error("failed to patch secret {namespace}/{name}: {reason}")]
    Patch {
        namespace: String,
        name: String,
        reason: String,
    },
    #[error("cluster API call for secret {namespace}/{name} timed out")]
    Timeout { namespace: String, name: String },
}

/// Missing or invalid settings detected before any run can occur
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
    #[error("Failed to load secret mappings from {path}: {reason}")]
    MappingsFile { path: String, reason: String },
    #[error("Invalid secret mapping at index {index}: {reason}")]
    InvalidMapping { index: usize, reason: String },
    #[error("Invalid value for {name}: {reason}")]
    InvalidSetting { name: String, reason: String },
}

/// Run-level failure surfaced to the caller of a refresh
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Vault authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),
    #[error("No secret mappings configured. Provide mappings in request or configmap.")]
    NoMappings,
    #[error("Invalid refresh request: {0}")]
    InvalidRequest(String),
}

impl SyncError {
    /// Whether the failure was caused by the request rather than the backends
    pub fn is_client_error(&self) -> bool {
        matches!(self, SyncError::NoMappings | SyncError::InvalidRequest(_))
    }
}
