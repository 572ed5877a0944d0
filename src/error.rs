//! Error types for the edgequake-doc2md library.
//!
//! Three error types map onto three layers of the library:
//!
//! * [`ConverterError`] — what a single converter function returns. It knows
//!   nothing about keys or formats; the dispatcher attaches those.
//!
//! * [`Doc2MdError`] — **Fatal** for the call that returned it: unknown
//!   format, a converter failure in single-document mode, a store that could
//!   not be read or written, invalid configuration.
//!
//! * [`EntryError`] — **Non-fatal**: one entry of a batch failed but the rest
//!   of the store is fine. Collected in [`crate::output::BatchReport`] under
//!   [`crate::config::FailurePolicy::CollectAndContinue`] so callers can
//!   inspect partial success instead of losing a whole store to one bad file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2md library.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Dispatch errors ───────────────────────────────────────────────────
    /// No converter is registered for the requested / derived / sniffed
    /// format and the registry has no fallback.
    #[error("No converter registered for format '{format}'{}", key_suffix(.key))]
    UnknownFormat { format: String, key: Option<String> },

    /// The selected converter ran and failed on the given bytes.
    #[error("Failed to convert {format}{}: {detail}", key_suffix(.key))]
    ConversionFailure {
        format: String,
        key: Option<String>,
        detail: String,
    },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// A batch entry failed under [`crate::config::FailurePolicy::FailFast`].
    #[error("Batch aborted on '{key}': {source}")]
    EntryFailed {
        key: String,
        #[source]
        source: EntryError,
    },

    // ── Store errors ──────────────────────────────────────────────────────
    /// Reading a value from the source store failed.
    #[error("Failed to read '{key}' from store: {source}")]
    StoreRead {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a value into the target store failed.
    #[error("Failed to write '{key}' to store: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key does not exist in the store.
    #[error("Key '{key}' not found in store")]
    KeyNotFound { key: String },

    /// The key would resolve outside the store root (`..`, absolute paths).
    #[error("Key '{key}' is not a valid relative store key")]
    InvalidKey { key: String },

    /// The directory backing a [`crate::store::DirStore`] is unusable.
    #[error("Store root '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn key_suffix(key: &Option<String>) -> String {
    match key {
        Some(k) => format!(" (key '{k}')"),
        None => String::new(),
    }
}

fn format_suffix(format: &Option<String>) -> String {
    match format {
        Some(f) => format!(" [{f}]"),
        None => String::new(),
    }
}

impl Doc2MdError {
    /// Convert a dispatch error into the per-entry form used by batch reports.
    pub(crate) fn into_entry_error(self, key: &str) -> EntryError {
        match self {
            Doc2MdError::UnknownFormat { format, .. } => EntryError {
                key: key.to_string(),
                format: Some(format.clone()),
                message: format!("no converter registered for format '{format}'"),
            },
            Doc2MdError::ConversionFailure { format, detail, .. } => EntryError {
                key: key.to_string(),
                format: Some(format),
                message: detail,
            },
            other => EntryError {
                key: key.to_string(),
                format: None,
                message: other.to_string(),
            },
        }
    }
}

/// Error returned by an individual converter function.
///
/// Converters see only bytes, so this carries no key or format; the
/// dispatcher wraps it into [`Doc2MdError::ConversionFailure`].
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The bytes are not a well-formed document of the expected format.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A required part of a container format is missing (e.g. `word/document.xml`).
    #[error("missing document part '{0}'")]
    MissingPart(String),

    /// The document parsed but contained no extractable content.
    #[error("document contains no extractable content")]
    Empty,

    /// I/O error while reading an in-memory container.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ConverterError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ConverterError::Io(io),
            other => ConverterError::Malformed(other.to_string()),
        }
    }
}

/// A non-fatal error for a single batch entry.
///
/// Stored in [`crate::output::BatchReport::failures`]. The overall batch
/// continues unless the caller chose [`crate::config::FailurePolicy::FailFast`].
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[error("'{key}'{}: {message}", format_suffix(.format))]
pub struct EntryError {
    /// Source key of the entry that failed.
    pub key: String,
    /// Format the dispatcher resolved, when it got that far.
    pub format: Option<String>,
    /// Human-readable failure detail.
    pub message: String,
}
