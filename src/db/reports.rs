//! Read-only joins of `entries` and `rework_log` keyed on `pcb_id`.

use rusqlite::{Connection, Row};

use super::entries::entry_from_row;
use crate::error::{StoreContext, TrackerResult};
use crate::models::{Entry, ReportRow, ReportStatus};

const REPORT_COLUMNS: &str = "e.sr_no, e.pcb_id, e.model, e.rejection_details, r.id, r.rework_no,
     r.rework_done_by, COALESCE(r.rework_date, e.timestamp), r.rework_action";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    let rework_id: Option<i64> = row.get(4)?;
    Ok(ReportRow {
        sr_no: row.get(0)?,
        pcb_id: row.get(1)?,
        model: row.get(2)?,
        rejection_details: row.get(3)?,
        status: if rework_id.is_some() {
            ReportStatus::Reworked
        } else {
            ReportStatus::Pending
        },
        rework_no: row.get(5)?,
        rework_done_by: row.get(6)?,
        date: row.get(7)?,
        rework_action: row.get(8)?,
    })
}

/// Live entries with no ledger rows at all, newest first.
pub fn fetch_pending(conn: &Connection) -> TrackerResult<Vec<Entry>> {
    let mut stmt = conn
        .prepare(
            "SELECT e.sr_no, e.pcb_id, e.model, e.timestamp, e.rejection_stage, e.rejection_details
             FROM entries e
             LEFT JOIN rework_log r ON e.pcb_id = r.pcb_id
             WHERE r.id IS NULL
             ORDER BY e.sr_no DESC",
        )
        .store_context("failed to prepare pending query")?;

    let entries = stmt
        .query_map([], entry_from_row)
        .store_context("failed to load pending entries")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect pending entries")?;

    Ok(entries)
}

/// Entries that still exist alongside ledger rows. Only non-empty when a
/// rework was logged without resolving its entry; those rows are reported
/// as `Reworked` rather than hidden.
pub fn fetch_reworked(conn: &Connection) -> TrackerResult<Vec<ReportRow>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {REPORT_COLUMNS}
             FROM entries e
             INNER JOIN rework_log r ON e.pcb_id = r.pcb_id
             ORDER BY e.pcb_id, r.rework_no"
        ))
        .store_context("failed to prepare reworked query")?;

    let rows = stmt
        .query_map([], report_from_row)
        .store_context("failed to load reworked rows")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect reworked rows")?;

    Ok(rows)
}

/// Every live entry, one row per matching rework (or one pending row).
pub fn fetch_status_overview(conn: &Connection) -> TrackerResult<Vec<ReportRow>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {REPORT_COLUMNS}
             FROM entries e
             LEFT JOIN rework_log r ON e.pcb_id = r.pcb_id
             ORDER BY e.sr_no, r.rework_no"
        ))
        .store_context("failed to prepare status overview query")?;

    let rows = stmt
        .query_map([], report_from_row)
        .store_context("failed to load status overview")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect status overview")?;

    Ok(rows)
}
