use rusqlite::Connection;

use crate::error::{StoreContext, TrackerResult};

/// Row counts removed by [`clear_all_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedCounts {
    pub entries: usize,
    pub reworks: usize,
    pub models: usize,
}

/// Wipe entries, the rework ledger, and the model list. Operators survive so
/// the floor can keep logging in. Callers run this inside one transaction.
pub fn clear_all_data(conn: &Connection) -> TrackerResult<ClearedCounts> {
    let entries = conn
        .execute("DELETE FROM entries", [])
        .store_context("failed to clear entries")?;
    let reworks = conn
        .execute("DELETE FROM rework_log", [])
        .store_context("failed to clear rework log")?;
    let models = conn
        .execute("DELETE FROM models", [])
        .store_context("failed to clear models")?;

    Ok(ClearedCounts {
        entries,
        reworks,
        models,
    })
}
