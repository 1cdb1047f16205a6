use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::error::{StoreContext, TrackerResult};
use crate::models::ReworkLogEntry;

const REWORK_COLUMNS: &str = "id, pcb_id, rework_no, rework_action, rework_date, rework_done_by";

fn rework_from_row(row: &Row<'_>) -> rusqlite::Result<ReworkLogEntry> {
    Ok(ReworkLogEntry {
        id: row.get(0)?,
        pcb_id: row.get(1)?,
        rework_no: row.get(2)?,
        rework_action: row.get(3)?,
        rework_date: row.get(4)?,
        rework_done_by: row.get(5)?,
    })
}

/// Number of rework rows recorded for a PCB.
pub fn count_reworks(conn: &Connection, pcb_id: &str) -> TrackerResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM rework_log WHERE pcb_id = ?1",
        [pcb_id],
        |row| row.get(0),
    )
    .store_context("failed to count reworks")
}

/// Sequence number the next rework for `pcb_id` should receive. Must run in
/// the same transaction as the insert that uses it.
pub fn next_rework_no(conn: &Connection, pcb_id: &str) -> TrackerResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(rework_no), 0) + 1 FROM rework_log WHERE pcb_id = ?1",
        [pcb_id],
        |row| row.get(0),
    )
    .store_context("failed to compute next rework number")
}

pub fn insert_rework(
    conn: &Connection,
    pcb_id: &str,
    rework_no: i64,
    rework_action: &str,
    rework_date: NaiveDateTime,
    rework_done_by: &str,
) -> TrackerResult<ReworkLogEntry> {
    conn.execute(
        "INSERT INTO rework_log (pcb_id, rework_no, rework_action, rework_date, rework_done_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![pcb_id, rework_no, rework_action, rework_date, rework_done_by],
    )
    .store_context("failed to insert rework")?;

    Ok(ReworkLogEntry {
        id: conn.last_insert_rowid(),
        pcb_id: pcb_id.to_string(),
        rework_no,
        rework_action: rework_action.to_string(),
        rework_date,
        rework_done_by: rework_done_by.to_string(),
    })
}

/// Full audit trail for one PCB, oldest rework first.
pub fn fetch_reworks_for_pcb(conn: &Connection, pcb_id: &str) -> TrackerResult<Vec<ReworkLogEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {REWORK_COLUMNS} FROM rework_log WHERE pcb_id = ?1 ORDER BY rework_no"
        ))
        .store_context("failed to prepare rework history query")?;

    let reworks = stmt
        .query_map([pcb_id], rework_from_row)
        .store_context("failed to load rework history")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect rework history")?;

    Ok(reworks)
}

/// Every ledger row in insertion order. Feeds the log viewer and the
/// spreadsheet backup.
pub fn fetch_all_reworks(conn: &Connection) -> TrackerResult<Vec<ReworkLogEntry>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {REWORK_COLUMNS} FROM rework_log ORDER BY id"))
        .store_context("failed to prepare rework log query")?;

    let reworks = stmt
        .query_map([], rework_from_row)
        .store_context("failed to load rework log")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect rework log")?;

    Ok(reworks)
}
