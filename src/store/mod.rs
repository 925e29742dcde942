//! Document store abstraction for lobby and session documents.
//!
//! The store offers versioned compare-and-swap writes: every read returns a
//! [`Versioned`] wrapper, and every update names the version it read. A
//! mismatched version fails with [`StoreError::Conflict`] so the caller can
//! retry against a fresh read instead of silently overwriting a concurrent
//! write. Connected clients observe the store's writes through its change
//! feed; the core only writes authoritative documents.

mod memory;

pub use memory::MemoryStore;

use derive_more::{Display, Error};

use crate::lobby::Lobby;
use crate::session::{MoveRecord, Session};

/// Bound on internal optimistic-transaction retries before a conflict
/// surfaces to the caller.
pub const MAX_TXN_RETRIES: usize = 5;

/// A document together with the store version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// Monotonic per-document version, bumped on every write.
    pub version: u64,
    /// The document itself.
    pub doc: T,
}

/// Storage-layer errors.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum StoreError {
    /// No document exists under the given id.
    #[display("{kind} '{id}' not found")]
    NotFound {
        /// Document collection name.
        kind: &'static str,
        /// The missing id.
        id: String,
    },
    /// A document already exists under the given id.
    #[display("{kind} '{id}' already exists")]
    AlreadyExists {
        /// Document collection name.
        kind: &'static str,
        /// The duplicate id.
        id: String,
    },
    /// A concurrent write invalidated the caller's read; retry with a fresh
    /// read.
    #[display("concurrent modification of {kind} '{id}'")]
    Conflict {
        /// Document collection name.
        kind: &'static str,
        /// The contested id.
        id: String,
    },
}

/// Persistent document store for lobbies, sessions, and their move logs.
///
/// Implementations must maintain the waiting-lobby-per-user index in the same
/// transaction as lobby membership changes, and must append a move record
/// atomically with the session update that produced it.
pub trait DocumentStore: Send + Sync {
    /// Creates a lobby document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] on an id collision.
    fn create_lobby(&self, lobby: Lobby) -> Result<Versioned<Lobby>, StoreError>;

    /// Reads a lobby document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is unknown.
    fn get_lobby(&self, id: &str) -> Result<Versioned<Lobby>, StoreError>;

    /// Lists every lobby document, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the read fails.
    fn list_lobbies(&self) -> Result<Vec<Versioned<Lobby>>, StoreError>;

    /// Replaces a lobby document if its version is still `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the document changed since the
    /// caller's read, or [`StoreError::NotFound`] if it was deleted.
    fn update_lobby(
        &self,
        expected_version: u64,
        lobby: Lobby,
    ) -> Result<Versioned<Lobby>, StoreError>;

    /// Deletes a lobby document if its version is still `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a version mismatch or
    /// [`StoreError::NotFound`] if already gone.
    fn delete_lobby(&self, id: &str, expected_version: u64) -> Result<(), StoreError>;

    /// Looks up the Waiting lobby a user currently belongs to, if any.
    ///
    /// Served from a secondary index maintained alongside lobby writes, so
    /// the check is O(1) rather than a scan over all lobbies.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the read fails.
    fn waiting_lobby_for_user(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    /// Creates a session document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] on an id collision.
    fn create_session(&self, session: Session) -> Result<Versioned<Session>, StoreError>;

    /// Reads a session document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is unknown.
    fn get_session(&self, id: &str) -> Result<Versioned<Session>, StoreError>;

    /// Replaces a session document if its version is still `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a version mismatch or
    /// [`StoreError::NotFound`] if the session was never created.
    fn update_session(
        &self,
        expected_version: u64,
        session: Session,
    ) -> Result<Versioned<Session>, StoreError>;

    /// Deletes a session document and its move log if its version is still
    /// `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a version mismatch or
    /// [`StoreError::NotFound`] if already gone.
    fn delete_session(&self, id: &str, expected_version: u64) -> Result<(), StoreError>;

    /// Replaces a session document and appends one move record in a single
    /// atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a version mismatch; the move log
    /// is untouched on any failure.
    fn update_session_with_move(
        &self,
        expected_version: u64,
        session: Session,
        record: MoveRecord,
    ) -> Result<Versioned<Session>, StoreError>;

    /// Reads a session's move log in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the session id is unknown.
    fn list_moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, StoreError>;
}
