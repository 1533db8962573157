//! Session-level peer state, as tracked by a `TorrentTask` (distinct from
//! `tracker::Peer`, which is just the `ip`/`port` pair a tracker hands back).
//!
//! Grounded in `original_source/pkg/peer/peer.go`'s `Peer` struct.
use std::time::SystemTime;

pub mod handshake;

pub use handshake::Handshake;

/// One peer a `TorrentTask` is connected to, or has been told about.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub ip: String,
    pub port: u16,
    pub choked: bool,
    pub interested: bool,
    pub last_seen: SystemTime,
    pub id: String,
}

impl Peer {
    pub fn new(ip: String, port: u16) -> Self {
        Peer {
            ip,
            port,
            choked: true,
            interested: false,
            last_seen: SystemTime::now(),
            id: String::new(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn touch(&mut self) {
        self.last_seen = SystemTime::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_peer_starts_choked_and_uninterested() {
        let peer = Peer::new("10.0.0.1".to_string(), 6881);
        assert!(peer.choked);
        assert!(!peer.interested);
        assert_eq!(peer.address(), "10.0.0.1:6881");
    }
}
