//! This module implements the BitTorrent peer handshake protocol.
//!
//! The handshake is the first message exchanged between two peers. It verifies
//! that both peers are participating in the same torrent (via info_hash) and
//! establishes basic protocol compatibility.
use crate::torrent::{TorrentError, TorrentResult};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::instrument;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/** Represents a BitTorrent handshake message as defined in the BitTorrent protocol.

A handshake is the first message exchanged between peers and contains:
- Protocol identifier ("BitTorrent protocol")
- Reserved bytes for protocol extensions
- Info hash identifying the torrent
- Peer ID identifying the client */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_len: u8,
    pub protocol: [u8; 19],
    pub reserved: [u8; 8],
    pub info_hash: [u8; 20],
    pub peer_id: [u8; 20],
}

impl Handshake {
    /** Creates a new handshake with the specified info hash and peer ID.

    Arguments:
    - info_hash - The SHA-1 hash of the torrent's info dictionary
    - peer_id - A unique identifier for this client

    Returns:
    A new Handshake instance with default protocol settings */
    pub fn new(info_hash: [u8; 20], peer_id: [u8; 20]) -> Self {
        Self {
            protocol_len: 19,
            protocol: *b"BitTorrent protocol",
            reserved: [0u8; 8],
            info_hash,
            peer_id,
        }
    }

    /** Serializes the handshake into a 68-byte array as per the BitTorrent protocol.

    The serialized format is:
    - 1 byte: protocol string length (19)
    - 19 bytes: protocol string ("BitTorrent protocol")
    - 8 bytes: reserved bytes (all zeros)
    - 20 bytes: info hash
    - 20 bytes: peer ID

    Returns:
    A 68-byte array containing the serialized handshake */
    #[instrument(level = "trace")]
    pub fn serialize(&self) -> [u8; 68] {
        let mut buf = [0u8; 68];
        buf[0] = self.protocol_len;
        buf[1..20].copy_from_slice(&self.protocol);
        buf[20..28].copy_from_slice(&self.reserved);
        buf[28..48].copy_from_slice(&self.info_hash);
        buf[48..68].copy_from_slice(&self.peer_id);
        buf
    }

    /// Parses a handshake out of a freshly-read 67-byte tail (everything
    /// after the protocol-length byte, which the caller already validated).
    fn parse_tail(protocol_len: u8, buf: &[u8; 67]) -> TorrentResult<Self> {
        let mut protocol = [0u8; 19];
        protocol.copy_from_slice(&buf[0..19]);
        if &protocol != b"BitTorrent protocol" {
            return Err(TorrentError::HandshakeInvalidProtocol);
        }

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&buf[19..27]);

        let mut info_hash = [0u8; 20];
        info_hash.copy_from_slice(&buf[27..47]);

        let mut peer_id = [0u8; 20];
        peer_id.copy_from_slice(&buf[47..67]);

        Ok(Self {
            protocol_len,
            protocol,
            reserved,
            info_hash,
            peer_id,
        })
    }

    /** Reads a handshake from a `tokio::net::TcpStream`, bounded by
    [`HANDSHAKE_TIMEOUT`].

    Reads exactly 68 bytes from the provided TCP stream and parses them into
    a `Handshake`, validating the protocol length and string.

    # Errors
    - `HandshakeTimeout` if the peer doesn't send a full handshake in time.
    - `HandshakeInvalidProtocol` if `protocol_len` isn't 19 or the protocol
      string doesn't match.
    - `Io` for any underlying I/O failure (e.g. connection closed). */
    #[instrument(level = "trace", skip(stream))]
    pub async fn read(stream: &mut TcpStream) -> TorrentResult<Self> {
        timeout(HANDSHAKE_TIMEOUT, Self::read_unbounded(stream))
            .await
            .map_err(|_| TorrentError::HandshakeTimeout)?
    }

    async fn read_unbounded(stream: &mut TcpStream) -> TorrentResult<Self> {
        let mut length_buf = [0u8; 1];
        stream.read_exact(&mut length_buf).await?;
        let protocol_len = length_buf[0];
        if protocol_len != 19 {
            return Err(TorrentError::HandshakeInvalidProtocol);
        }

        let mut buf = [0u8; 67];
        stream.read_exact(&mut buf).await?;
        Self::parse_tail(protocol_len, &buf)
    }

    /** Validates that this handshake's info hash matches the expected value.

    Returns `HandshakeInfoHashMismatch` if the info hashes don't match. */
    pub fn validate(&self, expected_info_hash: [u8; 20]) -> TorrentResult<()> {
        if self.info_hash != expected_info_hash {
            return Err(TorrentError::HandshakeInfoHashMismatch);
        }
        Ok(())
    }

    /// Performs a complete handshake with a peer over a TCP connection.
    ///
    /// Connects to `peer_addr`, sends our handshake, reads the peer's
    /// handshake back, and validates its info hash against ours before
    /// returning it.
    #[instrument(level = "debug", skip(peer_addr))]
    pub async fn do_handshake(
        peer_addr: &str,
        info_hash: [u8; 20],
        peer_id: [u8; 20],
    ) -> TorrentResult<Handshake> {
        let mut stream = TcpStream::connect(peer_addr).await?;

        let our_handshake = Handshake::new(info_hash, peer_id);
        stream.write_all(&our_handshake.serialize()).await?;

        let their_handshake = Handshake::read(&mut stream).await?;
        their_handshake.validate(info_hash)?;
        Ok(their_handshake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_produces_the_68_byte_wire_layout() {
        let handshake = Handshake::new([1u8; 20], [2u8; 20]);
        let bytes = handshake.serialize();
        assert_eq!(bytes.len(), 68);
        assert_eq!(bytes[0], 19);
        assert_eq!(&bytes[1..20], b"BitTorrent protocol");
        assert_eq!(&bytes[20..28], &[0u8; 8]);
        assert_eq!(&bytes[28..48], &[1u8; 20]);
        assert_eq!(&bytes[48..68], &[2u8; 20]);
    }

    #[test]
    fn parse_tail_rejects_wrong_protocol_string() {
        let mut buf = [0u8; 67];
        buf[0..19].copy_from_slice(b"not the right proto");
        let err = Handshake::parse_tail(19, &buf).unwrap_err();
        assert!(matches!(err, TorrentError::HandshakeInvalidProtocol));
    }

    #[test]
    fn parse_tail_round_trips_a_serialized_handshake() {
        let handshake = Handshake::new([3u8; 20], [4u8; 20]);
        let bytes = handshake.serialize();
        let mut tail = [0u8; 67];
        tail.copy_from_slice(&bytes[1..68]);
        let parsed = Handshake::parse_tail(bytes[0], &tail).unwrap();
        assert_eq!(parsed, handshake);
    }

    #[test]
    fn validate_rejects_mismatched_info_hash() {
        let handshake = Handshake::new([5u8; 20], [6u8; 20]);
        let err = handshake.validate([9u8; 20]).unwrap_err();
        assert!(matches!(err, TorrentError::HandshakeInfoHashMismatch));
    }

    #[test]
    fn validate_accepts_matching_info_hash() {
        let handshake = Handshake::new([5u8; 20], [6u8; 20]);
        assert!(handshake.validate([5u8; 20]).is_ok());
    }
}
