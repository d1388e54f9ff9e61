//! Error types for the persistence and precomputation engine.

use thiserror::Error;

/// Errors that can occur while opening, writing to, or reading from a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying RocksDB operation failed.
    #[error("storage engine error: {0}")]
    Engine(#[from] rocksdb::Error),

    /// Record could not be serialized or deserialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] Box<bincode::ErrorKind>),

    /// I/O error managing the store directory or descriptor file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk descriptor could not be parsed as JSON.
    #[error("malformed store descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// The on-disk descriptor's version does not match this build's expected version.
    #[error("store version mismatch: descriptor has {found}, expected {expected}")]
    VersionMismatch {
        /// Version recorded in the on-disk descriptor.
        found: String,
        /// Version this build requires.
        expected: String,
    },

    /// A precomputation or import operation was cancelled before completing.
    #[error("operation cancelled")]
    Cancelled,

    /// A column family was requested that does not exist in this store.
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),
}

/// Convenience alias for results returned by this crate.
pub type StoreResult<T> = Result<T, StoreError>;
