//! Error types for preference storage.

use thiserror::Error;

/// Error types for preference reads and writes.
#[derive(Error, Debug)]
pub enum PrefsError {
    /// Low-level I/O error from std::io.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value exists but has the wrong JSON type.
    #[error("malformed preference value for key '{0}'")]
    Format(String),
}
