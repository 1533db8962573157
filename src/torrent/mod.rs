//! Torrent metafile model and per-download task state.
//!
//! This module provides the concrete record shapes the bencode schema binder
//! targets (`TorrentFile`, `InfoDict`, `FileEntry`) and the mutable,
//! concurrency-safe `TorrentTask` that tracks one download's progress.
use thiserror::Error;

pub mod file;
pub mod info_hash;
pub mod task;

pub use file::{FileEntry, InfoDict, TorrentFile};
pub use task::{TorrentStatus, TorrentTask};

#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    #[error("pieces length is not a multiple of 20")]
    InvalidPiecesLength,

    #[error("handshake failed: invalid protocol identifier")]
    HandshakeInvalidProtocol,

    #[error("handshake failed: info hash mismatch")]
    HandshakeInfoHashMismatch,

    #[error("handshake timed out")]
    HandshakeTimeout,
}

/// Result type for torrent operations derived from `std::result`.
pub type TorrentResult<T> = std::result::Result<T, TorrentError>;
