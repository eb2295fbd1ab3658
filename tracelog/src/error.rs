use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while filtering or counting trace logs
#[derive(Debug, Error)]
pub enum TraceError {
    /// Cannot open an input or output path
    #[error("Failed to open {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cannot create the run-metadata output
    #[error("Failed to create metadata file {}: {source}", .path.display())]
    FileCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed filter spec, or malformed timestamp on the index path
    #[error("Invalid format in '{input}': {reason}")]
    InvalidFormat { input: String, reason: String },

    /// Filter spec with the wrong number of parts
    #[error("Invalid parameter count in '{input}': expected {expected}, got {got}")]
    InvalidParameterCount {
        input: String,
        expected: usize,
        got: usize,
    },

    /// The producer thread could not be launched
    #[error("Failed to spawn producer thread: {0}")]
    ThreadCreation(std::io::Error),

    /// Filter kind not recognized
    #[error("Unknown filter kind: {0}")]
    UnknownKind(String),

    /// Numeric literal outside the representable range
    #[error("Value out of range in '{0}'")]
    OutOfRange(String),

    /// A record was requested but none is available
    #[error("No records available")]
    NoData,

    /// I/O error while reading or writing log data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for trace log operations
pub type Result<T> = std::result::Result<T, TraceError>;
