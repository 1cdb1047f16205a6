use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{is_constraint_violation, StoreContext, TrackerError, TrackerResult};
use crate::models::Entry;

const ENTRY_COLUMNS: &str =
    "sr_no, pcb_id, model, timestamp, rejection_stage, rejection_details";

pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        sr_no: row.get(0)?,
        pcb_id: row.get(1)?,
        model: row.get(2)?,
        timestamp: row.get(3)?,
        rejection_stage: row.get(4)?,
        rejection_details: row.get(5)?,
    })
}

/// Insert a pending entry. A second live entry for the same PCB trips the
/// UNIQUE constraint and comes back as `DuplicatePcb`.
pub fn insert_entry(
    conn: &Connection,
    pcb_id: &str,
    model: &str,
    timestamp: NaiveDateTime,
    rejection_stage: &str,
    rejection_details: &str,
) -> TrackerResult<Entry> {
    conn.execute(
        "INSERT INTO entries (pcb_id, model, timestamp, rejection_stage, rejection_details)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![pcb_id, model, timestamp, rejection_stage, rejection_details],
    )
    .map_err(|err| {
        if is_constraint_violation(&err) {
            TrackerError::DuplicatePcb(pcb_id.to_string())
        } else {
            TrackerError::Store {
                action: "failed to insert entry",
                source: err,
            }
        }
    })?;

    Ok(Entry {
        sr_no: conn.last_insert_rowid(),
        pcb_id: pcb_id.to_string(),
        model: model.to_string(),
        timestamp,
        rejection_stage: rejection_stage.to_string(),
        rejection_details: rejection_details.to_string(),
    })
}

/// The live entry for a PCB, if it is still pending.
pub fn find_entry(conn: &Connection, pcb_id: &str) -> TrackerResult<Option<Entry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE pcb_id = ?1"),
        [pcb_id],
        entry_from_row,
    )
    .optional()
    .store_context("failed to look up entry")
}

/// Every live entry in insertion order.
pub fn fetch_entries(conn: &Connection) -> TrackerResult<Vec<Entry>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY sr_no"))
        .store_context("failed to prepare entries query")?;

    let entries = stmt
        .query_map([], entry_from_row)
        .store_context("failed to load entries")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect entries")?;

    Ok(entries)
}

/// Remove the live entry for a PCB and return how many rows went away.
/// Zero is not an error: resolving an already-resolved PCB is a no-op.
pub fn delete_entry(conn: &Connection, pcb_id: &str) -> TrackerResult<usize> {
    conn.execute("DELETE FROM entries WHERE pcb_id = ?1", [pcb_id])
        .store_context("failed to delete entry")
}
