use std::time::Instant;

use crate::db::Database;
use crate::services::oracle::ScoringOracle;

/// Shared per-process state handed to every request handler. The
/// database pool and the oracle selection are fixed at startup; nothing
/// else is shared across invocations.
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    db: Database,
    oracle: ScoringOracle,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: Database, oracle: ScoringOracle, max_upload_bytes: usize) -> Self {
        Self {
            started_at: Instant::now(),
            db,
            oracle,
            max_upload_bytes,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn oracle(&self) -> &ScoringOracle {
        &self.oracle
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
