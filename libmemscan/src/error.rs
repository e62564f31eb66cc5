//! Error taxonomy for platform access, the process facade, and the scan engine.
//!
//! Kinds, not strings: callers match on variant rather than parse messages.

use thiserror::Error;

/// Failure opening a handle to a target process.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("no such process")]
    NotFound,
    #[error("access denied")]
    AccessDenied,
    #[error("failed to open process: {0}")]
    Other(String),
}

impl OpenError {
    /// Classify an OS-level I/O failure into the taxonomy above.
    pub(crate) fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => OpenError::NotFound,
            std::io::ErrorKind::PermissionDenied => OpenError::AccessDenied,
            _ => OpenError::Other(err.to_string()),
        }
    }
}

/// Failure reading a fixed-size byte range out of a target process.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("short read")]
    ShortRead,
    #[error("unreadable")]
    Unreadable,
}

/// Failure writing a fixed-size byte range into a target process.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("short write")]
    ShortWrite,
    #[error("unwritable")]
    Unwritable,
}

/// API misuse surfaced by the scan engine itself, as opposed to per-record
/// read/write failures (which are absorbed by dropping the record).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    #[error("value width does not match the scan's current width")]
    WidthMismatch,
    #[error("scan has no current candidate set")]
    NotPopulated,
}
