use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use lru::LruCache;

use crate::endpoint::ClientKey;

/// Per-connection lifecycle state, named after the phase of the current
/// command/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResultset,
    ReadingColumns,
    ReadingRows,
}

/// MySQL command codes the decoder dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Query,
    StmtPrepare,
    StmtExecute,
    StmtClose,
    Other(u8),
}

/// Per-`ClientKey` session state. Owned exclusively by `SessionTable`.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub cmd: Option<Command>,
    pub stmt_id: Option<u32>,
    pub tx_id: String,
    pub col_count: usize,
    pub cols_received: usize,
    pub col_types: Vec<u8>,
    pub query: Option<String>,
    /// A `COM_STMT_PREPARE` was issued on this client endpoint; carries the
    /// submitted query text until the matching `PREPARE_OK` (or error)
    /// response arrives.
    pub pending_prepare: Option<String>,
    /// Set while a PREPARE_OK's trailing column/parameter definition packets
    /// (terminated by an EOF) are being discarded, so they don't corrupt the
    /// normal result-set state machine.
    pub skipping_prepare_ok_tail: bool,
    /// Every `stmt_id` this session has successfully prepared (registered on
    /// `PREPARE_OK`). Used to destroy the corresponding `PreparedStatement`s
    /// in `StatementRegistry` when this session is evicted.
    pub owned_stmt_ids: Vec<u32>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            state: SessionState::Idle,
            cmd: None,
            stmt_id: None,
            tx_id: String::new(),
            col_count: 0,
            cols_received: 0,
            col_types: Vec::new(),
            query: None,
            pending_prepare: None,
            skipping_prepare_ok_tail: false,
            owned_stmt_ids: Vec::new(),
        }
    }
}

impl Session {
    /// Clears command/result-set tracking and mints a fresh `tx_id`, as done
    /// whenever a new to-server command packet arrives. `pending_prepare` is
    /// untouched: it has its own lifecycle keyed off the PREPARE/PREPARE_OK
    /// exchange, not the per-command reset.
    pub fn reset_for_new_command(&mut self, cmd: Command, tx_id: String) {
        self.state = SessionState::Idle;
        self.cmd = Some(cmd);
        self.stmt_id = None;
        self.tx_id = tx_id;
        self.col_count = 0;
        self.cols_received = 0;
        self.col_types.clear();
        self.query = None;
        self.skipping_prepare_ok_tail = false;
    }

    pub fn to_idle(&mut self) {
        self.state = SessionState::Idle;
        self.stmt_id = None;
        self.col_count = 0;
        self.cols_received = 0;
        self.col_types.clear();
    }
}

/// Thread-confined `ClientKey -> Session` map with LRU eviction. The spec
/// assigns `SessionTable` exclusively to the decoder thread, so this carries
/// no internal locking beyond what's needed to share the handle cheaply.
#[derive(Debug, Clone)]
pub struct SessionTable {
    sessions: Arc<RwLock<LruCache<ClientKey, Session>>>,
}

const DEFAULT_SESSION_CAP: usize = 10_000;

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_SESSION_CAP).unwrap());
        SessionTable {
            sessions: Arc::new(RwLock::new(LruCache::new(cap))),
        }
    }

    /// Looks up the session for `key`, inserting a fresh `Idle` one if
    /// absent. Returns the session plus the `(key, session)` pair evicted to
    /// make room for it, if inserting a fresh session pushed the table over
    /// capacity — callers must destroy that evicted session's owned
    /// `PreparedStatement`s in `StatementRegistry`, since an evicted session
    /// is otherwise indistinguishable from one that never existed.
    pub fn get_or_insert(&self, key: ClientKey) -> (Session, Option<(ClientKey, Session)>) {
        let mut cache = self.sessions.write().unwrap();
        if cache.contains(&key) {
            return (cache.get(&key).cloned().unwrap(), None);
        }
        // `key` is new, so any pair `push` hands back here evicted a
        // *different* entry rather than replacing this one.
        let evicted = cache.push(key, Session::default());
        (cache.get(&key).cloned().unwrap(), evicted)
    }

    /// Inserts/updates the session for `key`. Returns the `(key, session)`
    /// pair evicted to stay within capacity, if any — callers must destroy
    /// that session's owned `PreparedStatement`s in `StatementRegistry`,
    /// since an evicted session is otherwise indistinguishable from one that
    /// never existed. Replacing `key`'s own prior value is not an eviction.
    pub fn put(&self, key: ClientKey, session: Session) -> Option<(ClientKey, Session)> {
        let mut cache = self.sessions.write().unwrap();
        cache.push(key, session).filter(|(evicted_key, _)| *evicted_key != key)
    }

    pub fn remove(&self, key: &ClientKey) -> Option<Session> {
        let mut cache = self.sessions.write().unwrap();
        cache.pop(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAP)
    }
}
