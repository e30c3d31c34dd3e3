//! Error types.
//!
//! Diagram commands never fail; these cover the boundaries where external
//! input or IO can go wrong: documents, the pose-stream protocol, the gesture
//! link, the document store and settings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing a diagram document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level `nodes` or `connections` is absent or not an array
    #[error("Invalid file format: missing {0} array")]
    MissingArray(&'static str),

    #[error("Document root must be an object")]
    NotAnObject,
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised while decoding pose messages or encoding frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed pose message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame has zero size")]
    EmptyFrame,

    #[error("Invalid frame payload: {0}")]
    InvalidFrame(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised by a gesture link transport
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Gesture link is not connected")]
    NotConnected,

    #[error("Gesture link is already connected")]
    AlreadyConnected,

    #[error("Gesture link closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type LinkResult<T> = Result<T, LinkError>;

/// Errors raised by a document store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No saved file with id {0}")]
    NotFound(String),

    #[error("No data directory available on this platform")]
    NoDataDir,

    #[error("Could not persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Used by in-memory stores to simulate a remote failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors raised by file-level operations of the file manager
#[derive(Error, Debug)]
pub enum FileError {
    #[error("No file is open")]
    NoOpenFile,

    #[error("File name cannot be empty")]
    EmptyName,

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type FileResult<T> = Result<T, FileError>;
