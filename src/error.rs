//! Error types for yfind

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors, raised before any traversal starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Size threshold without a usable numeric prefix
    #[error("invalid size threshold {input:?}: {reason}")]
    InvalidSize { input: String, reason: String },

    /// Size threshold whose unit is not one of k, m, g
    #[error("invalid size unit in {input:?}, expected one of k, m, g")]
    InvalidSizeUnit { input: String },

    /// Size threshold that does not fit in 64 bits once scaled
    #[error("size threshold {input:?} is too large")]
    SizeOverflow { input: String },

    /// Explicitly requested config file does not exist
    #[error("config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    /// Config file or environment value could not be merged
    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Top-level error for a scan run
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid filter configuration; nothing was scanned
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The scan could not start or its output failed
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Error kinds that can occur during scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Permission denied when accessing a file or directory
    PermissionDenied,
    /// File or directory not found (or vanished mid-scan)
    NotFound,
    /// Scan root is not a directory
    NotADirectory,
    /// I/O error during file operations
    IoError,
    /// Unknown error
    Unknown,
}

impl ScanErrorKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanErrorKind::PermissionDenied => "permission_denied",
            ScanErrorKind::NotFound => "not_found",
            ScanErrorKind::NotADirectory => "not_a_directory",
            ScanErrorKind::IoError => "io_error",
            ScanErrorKind::Unknown => "unknown",
        }
    }
}

/// Represents an error that occurred during scanning
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message} (path: {path:?})")]
pub struct ScanError {
    /// The kind of error
    pub kind: ScanErrorKind,
    /// The path where the error occurred
    pub path: Option<PathBuf>,
    /// Human-readable error message
    pub message: String,
}

impl ScanError {
    /// Create a new scan error
    pub fn new(kind: ScanErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::NotFound,
            Some(path.clone()),
            format!("Not found: {:?}", path),
        )
    }

    /// Create a not-a-directory error
    pub fn not_a_directory(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::NotADirectory,
            Some(path.clone()),
            format!("Not a directory: {:?}", path),
        )
    }

    /// Create an I/O error
    pub fn io_error(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::IoError, path, message)
    }

    /// Classify an `io::Error` and attach the path it happened on
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        Self::new(kind_of(err), Some(path), err.to_string())
    }

    /// Attach a path to an error that was created without one
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }
}

fn kind_of(err: &std::io::Error) -> ScanErrorKind {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => ScanErrorKind::PermissionDenied,
        std::io::ErrorKind::NotFound => ScanErrorKind::NotFound,
        _ => ScanErrorKind::IoError,
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::new(kind_of(&err), None, err.to_string())
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        let kind = match err.io_error() {
            Some(io) => kind_of(io),
            // Loop detection is the only walkdir error without an io::Error
            None => ScanErrorKind::Unknown,
        };
        Self::new(kind, path, err.to_string())
    }
}
