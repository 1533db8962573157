//! Torrent file structure and parsing logic.
//!
//! This module defines the `TorrentFile` struct and related helpers for
//! parsing, validating, and working with .torrent file metadata.
use crate::bencode::schema::{dict_mismatch, extract, extract_opt, insert, insert_opt};
use crate::bencode::{schema, BencodeError, BencodeRecord, BencodeResult, BencodeSchema, BencodeValue};
use crate::torrent::info_hash;
use crate::torrent::{TorrentError, TorrentResult};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const PIECE_HASH_LENGTH: usize = 20;

#[derive(Debug, PartialEq, Clone)]
pub struct TorrentFile {
    pub announce: String,
    pub announce_list: Vec<Vec<String>>,
    pub creation_date: Option<i64>,
    pub comment: String,
    pub created_by: String,
    pub info: InfoDict,
    pub info_hash: [u8; 20],
    pub pieces_hash: Vec<[u8; 20]>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct InfoDict {
    pub piece_length: i64,
    pub pieces: Vec<u8>,
    pub name: String,
    pub length: Option<i64>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct FileEntry {
    pub length: i64,
    pub path: Vec<String>,
}

impl BencodeSchema for FileEntry {
    fn from_bencode(value: BencodeValue) -> crate::bencode::BencodeResult<Self> {
        let dict = match value {
            BencodeValue::Dict(d) => d,
            other => return Err(dict_mismatch(&other)),
        };
        Ok(FileEntry {
            length: extract(&dict, "length")?,
            path: extract(&dict, "path")?,
        })
    }

    fn to_bencode(&self) -> BencodeValue {
        let mut dict = BTreeMap::new();
        insert(&mut dict, "length", &self.length);
        insert(&mut dict, "path", &self.path);
        BencodeValue::Dict(dict)
    }
}
impl BencodeRecord for FileEntry {}

impl BencodeSchema for InfoDict {
    fn from_bencode(value: BencodeValue) -> crate::bencode::BencodeResult<Self> {
        let dict = match value {
            BencodeValue::Dict(d) => d,
            other => return Err(dict_mismatch(&other)),
        };
        Ok(InfoDict {
            piece_length: extract(&dict, "piece length")?,
            pieces: extract(&dict, "pieces")?,
            name: extract(&dict, "name")?,
            length: extract_opt(&dict, "length")?,
            files: extract(&dict, "files")?,
        })
    }

    fn to_bencode(&self) -> BencodeValue {
        let mut dict = BTreeMap::new();
        insert(&mut dict, "piece length", &self.piece_length);
        insert(&mut dict, "pieces", &self.pieces);
        insert(&mut dict, "name", &self.name);
        insert_opt(&mut dict, "length", &self.length);
        if !self.files.is_empty() {
            insert(&mut dict, "files", &self.files);
        }
        BencodeValue::Dict(dict)
    }
}
impl BencodeRecord for InfoDict {}

impl BencodeSchema for TorrentFile {
    fn from_bencode(value: BencodeValue) -> crate::bencode::BencodeResult<Self> {
        let dict = match value {
            BencodeValue::Dict(d) => d,
            other => return Err(dict_mismatch(&other)),
        };

        let info_value = dict
            .get(b"info".as_slice())
            .cloned()
            .unwrap_or_else(|| BencodeValue::Dict(BTreeMap::new()));
        let info = InfoDict::from_bencode(info_value.clone())?;

        Ok(TorrentFile {
            announce: extract(&dict, "announce")?,
            announce_list: extract(&dict, "announce-list")?,
            creation_date: extract_opt(&dict, "creation date")?,
            comment: extract(&dict, "comment")?,
            created_by: extract(&dict, "created by")?,
            info_hash: info_hash::calculate_info_hash(&info_value)
                .unwrap_or([0u8; PIECE_HASH_LENGTH]),
            pieces_hash: parse_pieces(&info.pieces)?,
            info,
        })
    }

    fn to_bencode(&self) -> BencodeValue {
        let mut dict = BTreeMap::new();
        insert(&mut dict, "announce", &self.announce);
        if !self.announce_list.is_empty() {
            insert(&mut dict, "announce-list", &self.announce_list);
        }
        insert_opt(&mut dict, "creation date", &self.creation_date);
        if !self.comment.is_empty() {
            insert(&mut dict, "comment", &self.comment);
        }
        if !self.created_by.is_empty() {
            insert(&mut dict, "created by", &self.created_by);
        }
        insert(&mut dict, "info", &self.info);
        BencodeValue::Dict(dict)
    }
}
impl BencodeRecord for TorrentFile {}

/// Splits the concatenated SHA-1 hashes in `pieces` into one 20-byte array
/// per piece. `pieces.len()` not being a multiple of 20 is reported here as a
/// `BencodeError` (this runs inside `from_bencode`, which `BencodeSchema`
/// pins to `BencodeResult`) rather than swallowed — callers that reach
/// `TorrentFile` via the schema binder directly (`bencode::unmarshal`, or
/// `BencodeSchema::from_bencode` itself) must see the failure, not a
/// "successful" record with an empty `pieces_hash`.
fn parse_pieces(pieces: &[u8]) -> BencodeResult<Vec<[u8; PIECE_HASH_LENGTH]>> {
    if pieces.len() % PIECE_HASH_LENGTH != 0 {
        return Err(BencodeError::StringMalformed(format!(
            "pieces length {} is not a multiple of {PIECE_HASH_LENGTH}",
            pieces.len()
        )));
    }
    Ok(pieces
        .chunks_exact(PIECE_HASH_LENGTH)
        .map(|chunk| {
            let mut hash = [0u8; PIECE_HASH_LENGTH];
            hash.copy_from_slice(chunk);
            hash
        })
        .collect())
}

impl TorrentFile {
    /// Parses a `TorrentFile` out of raw bencoded bytes. `pieces` length
    /// validation happens inside `from_bencode` itself (see `parse_pieces`),
    /// so an invalid `pieces` field is reported here as the wrapped
    /// `TorrentError::Bencode` rather than re-checked redundantly.
    #[tracing::instrument(level = "debug", skip(data))]
    pub fn from_bytes(data: &[u8]) -> TorrentResult<Self> {
        let torrent: TorrentFile = schema::unmarshal(data)?;
        Ok(torrent)
    }

    /// Reads an entire `.torrent` file from disk and parses it.
    #[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TorrentResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Reads an entire `.torrent` stream and parses it.
    #[tracing::instrument(level = "debug", skip(reader))]
    pub fn from_reader<R: Read>(reader: &mut R) -> TorrentResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// The `creation date` field as a `SystemTime`, for callers that want
    /// the teacher's original ergonomic type rather than the raw unix
    /// timestamp the wire format actually carries.
    pub fn creation_date_time(&self) -> Option<SystemTime> {
        self.creation_date
            .and_then(|secs| u64::try_from(secs).ok())
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
    }

    /// Whether this torrent describes a directory of files rather than one
    /// flat file.
    pub fn is_directory(&self) -> bool {
        !self.info.files.is_empty()
    }

    /// Total length of all files in the torrent.
    pub fn total_length(&self) -> i64 {
        if self.is_directory() {
            self.info.files.iter().map(|f| f.length).sum()
        } else {
            self.info.length.unwrap_or(0)
        }
    }

    /// Total number of pieces in the torrent.
    pub fn num_pieces(&self) -> usize {
        self.pieces_hash.len()
    }

    /// Size, in bytes, of the piece at `index` — `piece_length` for every
    /// piece but the last, which may be shorter.
    pub fn piece_size(&self, index: usize) -> i64 {
        if index >= self.num_pieces() {
            return 0;
        }
        if index < self.num_pieces() - 1 {
            self.info.piece_length
        } else {
            let full_pieces_length = (self.num_pieces() - 1) as i64 * self.info.piece_length;
            let last_piece_size = self.total_length() - full_pieces_length;
            if last_piece_size <= 0 {
                self.info.piece_length
            } else {
                last_piece_size
            }
        }
    }

    /// File paths that contain data for the piece at `index`.
    pub fn file_paths_for_piece(&self, index: usize) -> Vec<PathBuf> {
        if index >= self.num_pieces() {
            return Vec::new();
        }
        let piece_start = index as i64 * self.info.piece_length;
        let piece_end = piece_start + self.piece_size(index);
        let mut current_data_position: i64 = 0;
        let mut result_paths = Vec::new();

        if !self.is_directory() {
            result_paths.push(PathBuf::from(&self.info.name));
        } else {
            for file_info in &self.info.files {
                let file_start = current_data_position;
                let file_end = file_start + file_info.length;
                if file_end > piece_start && file_start < piece_end {
                    let mut full_path = PathBuf::from(&self.info.name);
                    for component in &file_info.path {
                        full_path = full_path.join(component);
                    }
                    result_paths.push(full_path);
                }
                current_data_position = file_end;
            }
        }
        result_paths
    }
}
