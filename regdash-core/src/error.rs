/// Structured error types for regdash-core.
///
/// Uses `thiserror` so callers can match on the failure class (transport,
/// validation, stale snapshot, ...). The `regdash` binary wraps these in
/// `anyhow` for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Main error type for regdash-core operations
#[derive(Error, Debug)]
pub enum DashError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// JSON parsing or serialization failed
    #[error("JSON error at {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// No record in the local snapshot carries this identity
    #[error("No record with {field} = '{identity}' (the list may be stale, refresh it)")]
    NotFound { field: String, identity: String },

    /// A record has no usable value in its identity field
    #[error("Record is missing identity field '{field}'")]
    MissingIdentity { field: String },

    /// Two records share an identity value
    #[error("Duplicate identity {field} = '{identity}'")]
    DuplicateIdentity { field: String, identity: String },

    /// Delete confirmation did not match the record identity
    #[error("The entered {field} does not match (expected '{expected}', got '{entered}')")]
    IdentityMismatch {
        field: String,
        expected: String,
        entered: String,
    },

    /// One or more form fields failed validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Attempt to edit a field that is rendered disabled
    #[error("Field '{field}' is read-only")]
    ReadOnlyField { field: String },

    /// Field name not declared by the schema
    #[error("Unknown field '{field}'")]
    UnknownField { field: String },

    /// Value is not one of the select options
    #[error("'{value}' is not a valid option for {field}")]
    InvalidOption { field: String, value: String },

    /// Page size outside the enumerated set
    #[error("Invalid page size {0} (expected 10, 20 or 50)")]
    InvalidPageSize(usize),

    /// Resource name not known to the dashboard
    #[error("Unknown resource '{0}'")]
    UnknownResource(String),

    /// Remote answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// Network or decoding failure talking to the remote
    #[error("Request failed: {reason}")]
    Transport { reason: String },

    /// Config file path does not exist
    #[error("Path not found: {path:?}")]
    PathNotFound { path: PathBuf },
}

/// Result type alias for regdash-core operations
pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    /// Create a JSON error with context
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(field: impl Into<String>, identity: impl Into<String>) -> Self {
        Self::NotFound {
            field: field.into(),
            identity: identity.into(),
        }
    }

    /// Create a missing identity error
    pub fn missing_identity(field: impl Into<String>) -> Self {
        Self::MissingIdentity {
            field: field.into(),
        }
    }

    /// Create a duplicate identity error
    pub fn duplicate_identity(field: impl Into<String>, identity: impl Into<String>) -> Self {
        Self::DuplicateIdentity {
            field: field.into(),
            identity: identity.into(),
        }
    }

    /// Create a transport error
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// True when the failure came from the remote side (network or HTTP status)
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport { .. })
    }

    /// True when the local snapshot no longer matches the remote and a refresh is due
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
