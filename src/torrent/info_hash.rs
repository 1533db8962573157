//! SHA-1 hashing of the raw `info` dictionary, used as the torrent's
//! identity on the wire (tracker announces, peer handshakes).
use crate::bencode::{encoder, BencodeValue};
use crate::torrent::TorrentResult;
use sha1::{Digest, Sha1};

/// Hashes the canonical bencoded form of `info_value` (expected to be the
/// `BencodeValue::Dict` found under the torrent's top-level `info` key,
/// *before* it is bound onto `InfoDict` — the typed binding path drops
/// unknown keys, but `info_hash` must reflect exactly what was on the wire).
pub fn calculate_info_hash(info_value: &BencodeValue) -> TorrentResult<[u8; 20]> {
    let encoded = encoder::encode(info_value)?;

    let mut hasher = Sha1::new();
    hasher.update(&encoded);
    let digest = hasher.finalize();

    let mut info_hash = [0u8; 20];
    info_hash.copy_from_slice(&digest[..]);
    Ok(info_hash)
}
