//! Mutable, concurrency-safe state for one active download.
//!
//! Grounded directly in `original_source/pkg/engine/torrent_task.go`: field
//! names, the `sync.RWMutex`-guarded layout, and the exact semantics of
//! `UpdatePieceStatus`/`GetProgress`/`SetStatus` carry over unchanged, here
//! as a `std::sync::RwLock` (no `.await` ever happens while it's held, so a
//! std lock — not `tokio::sync::RwLock` — is the correct tool, per spec §5).
use crate::peer::Peer;
use crate::torrent::{TorrentError, TorrentFile, TorrentResult};
use std::sync::{Arc, RwLock};

const PIECE_HASH_LENGTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentStatus {
    Idle,
    Downloading,
    Paused,
    Completed,
    Error,
}

impl std::fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TorrentStatus::Idle => "Idle",
            TorrentStatus::Downloading => "Downloading",
            TorrentStatus::Paused => "Paused",
            TorrentStatus::Completed => "Completed",
            TorrentStatus::Error => "Error",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Default)]
struct TaskState {
    peers: Vec<Peer>,
    piece_status: Vec<bool>,
    availability: Vec<u32>,
    status_value: Option<TorrentStatus>,
    progress: f64,
    downloaded: u64,
    uploaded: u64,
}

/// Per-download progress tracker. Owns its `TorrentFile` for the task's
/// lifetime; peers and piece vectors live behind a single reader/writer lock
/// so concurrent `UpdatePieceStatus` calls on distinct indices commute and
/// `GetProgress` never observes a torn read.
#[derive(Debug)]
pub struct TorrentTask {
    pub torrent: Arc<TorrentFile>,
    state: RwLock<TaskState>,
}

impl TorrentTask {
    /// Creates a task in status `Idle` with `piece_status`/`availability`
    /// vectors of length `pieces.len() / 20`. Fails with
    /// `InvalidPiecesLength` if that division isn't exact.
    #[tracing::instrument(level = "debug", skip(torrent))]
    pub fn new(torrent: Arc<TorrentFile>) -> TorrentResult<Self> {
        if torrent.info.pieces.len() % PIECE_HASH_LENGTH != 0 {
            return Err(TorrentError::InvalidPiecesLength);
        }
        let num_pieces = torrent.info.pieces.len() / PIECE_HASH_LENGTH;

        Ok(TorrentTask {
            torrent,
            state: RwLock::new(TaskState {
                piece_status: vec![false; num_pieces],
                availability: vec![0; num_pieces],
                status_value: Some(TorrentStatus::Idle),
                ..Default::default()
            }),
        })
    }

    pub fn add_peer(&self, peer: Peer) {
        self.state.write().expect("torrent task lock poisoned").peers.push(peer);
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.state.read().expect("torrent task lock poisoned").peers.clone()
    }

    /// Sets `piece_status[index]`, recomputes `progress`, and transitions to
    /// `Completed` once every bit is set. A no-op for an out-of-range index
    /// or a bit that is already set (it never downgrades from `Completed`
    /// through this path, since a set bit can't be unset).
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn update_piece_status(&self, index: i64) {
        let mut state = self.state.write().expect("torrent task lock poisoned");
        if index < 0 {
            return;
        }
        let index = index as usize;
        if index >= state.piece_status.len() || state.piece_status[index] {
            return;
        }

        state.piece_status[index] = true;
        let completed = state.piece_status.iter().filter(|&&b| b).count();
        let total = state.piece_status.len();
        state.progress = if total == 0 { 1.0 } else { completed as f64 / total as f64 };
        if completed == total {
            state.status_value = Some(TorrentStatus::Completed);
        }
    }

    pub fn get_progress(&self) -> f64 {
        self.state.read().expect("torrent task lock poisoned").progress
    }

    pub fn status(&self) -> TorrentStatus {
        self.state
            .read()
            .expect("torrent task lock poisoned")
            .status_value
            .unwrap_or(TorrentStatus::Idle)
    }

    /// Unconditional status write. Per spec §4.4/§9, the engine — not this
    /// method — is responsible for never moving a task out of `Completed`;
    /// matching `torrent_task.go`'s `SetStatus`, this call does not enforce
    /// that on its own.
    pub fn set_status(&self, status: TorrentStatus) {
        self.state.write().expect("torrent task lock poisoned").status_value = Some(status);
    }

    pub fn record_downloaded(&self, bytes: u64) {
        self.state.write().expect("torrent task lock poisoned").downloaded += bytes;
    }

    pub fn record_uploaded(&self, bytes: u64) {
        self.state.write().expect("torrent task lock poisoned").uploaded += bytes;
    }

    pub fn downloaded(&self) -> u64 {
        self.state.read().expect("torrent task lock poisoned").downloaded
    }

    pub fn uploaded(&self) -> u64 {
        self.state.read().expect("torrent task lock poisoned").uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent::{FileEntry, InfoDict};

    fn torrent_with_pieces(n: usize) -> Arc<TorrentFile> {
        Arc::new(TorrentFile {
            announce: "http://example.com/announce".to_string(),
            announce_list: vec![],
            creation_date: None,
            comment: String::new(),
            created_by: String::new(),
            info: InfoDict {
                piece_length: 256,
                pieces: vec![0u8; 20 * n],
                name: "test.torrent".to_string(),
                length: Some(256 * n as i64),
                files: Vec::<FileEntry>::new(),
            },
            info_hash: [0u8; 20],
            pieces_hash: vec![[0u8; 20]; n],
        })
    }

    #[test]
    fn new_task_starts_idle_with_zeroed_vectors() {
        let task = TorrentTask::new(torrent_with_pieces(3)).unwrap();
        assert_eq!(task.status(), TorrentStatus::Idle);
        assert_eq!(task.get_progress(), 0.0);
    }

    #[test]
    fn rejects_pieces_length_not_a_multiple_of_twenty() {
        let mut torrent = (*torrent_with_pieces(1)).clone();
        torrent.info.pieces = vec![0u8; 15];
        let err = TorrentTask::new(Arc::new(torrent)).unwrap_err();
        assert!(matches!(err, TorrentError::InvalidPiecesLength));
    }

    #[test]
    fn update_piece_status_is_monotonic_and_completes() {
        let task = TorrentTask::new(torrent_with_pieces(3)).unwrap();

        task.update_piece_status(1);
        assert_eq!(task.get_progress(), 1.0 / 3.0);
        assert_eq!(task.status(), TorrentStatus::Idle);

        task.update_piece_status(2);
        assert_eq!(task.get_progress(), 2.0 / 3.0);

        task.update_piece_status(0);
        assert_eq!(task.get_progress(), 1.0);
        assert_eq!(task.status(), TorrentStatus::Completed);
    }

    #[test]
    fn out_of_range_updates_are_no_ops() {
        let task = TorrentTask::new(torrent_with_pieces(3)).unwrap();
        task.update_piece_status(-1);
        task.update_piece_status(5);
        assert_eq!(task.get_progress(), 0.0);
        assert_eq!(task.status(), TorrentStatus::Idle);
    }

    #[test]
    fn repeated_update_on_same_index_is_a_no_op() {
        let task = TorrentTask::new(torrent_with_pieces(4)).unwrap();
        task.update_piece_status(1);
        task.update_piece_status(1);
        assert_eq!(task.get_progress(), 1.0 / 4.0);
    }

    #[test]
    fn add_peer_and_status_transitions() {
        let task = TorrentTask::new(torrent_with_pieces(2)).unwrap();
        task.add_peer(Peer::new("127.0.0.1".to_string(), 6881));
        assert_eq!(task.peers().len(), 1);

        task.set_status(TorrentStatus::Downloading);
        assert_eq!(task.status(), TorrentStatus::Downloading);
        task.set_status(TorrentStatus::Paused);
        assert_eq!(task.status(), TorrentStatus::Paused);
    }

    #[test]
    fn concurrent_updates_on_distinct_indices_commute() {
        let task = Arc::new(TorrentTask::new(torrent_with_pieces(8)).unwrap());
        std::thread::scope(|scope| {
            for i in 0..8 {
                let task = Arc::clone(&task);
                scope.spawn(move || task.update_piece_status(i));
            }
        });
        assert_eq!(task.get_progress(), 1.0);
        assert_eq!(task.status(), TorrentStatus::Completed);
    }
}
