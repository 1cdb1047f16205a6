//! The rework ledger: moves a PCB through `Pending -> Resolved` and keeps the
//! append-only audit trail.
//!
//! State is derived rather than stored. A live row in `entries` means the PCB
//! is pending; no live row but at least one `rework_log` row means it has been
//! resolved; neither means the PCB ID is unknown. Resolving a PCB deletes its
//! entry, and further reworks against a resolved PCB simply append more
//! ledger rows.

use rusqlite::Connection;

use crate::auth::Session;
use crate::db::{
    clear_all_data, count_reworks, delete_entry, fetch_all_reworks, fetch_entries, fetch_models,
    fetch_reworks_for_pcb, find_entry, insert_entry, insert_model, insert_rework, next_rework_no,
    ClearedCounts, Store,
};
use crate::error::{require, TrackerError, TrackerResult};
use crate::models::{now, Entry, Model, ReworkLogEntry};

/// Derived lifecycle state of one PCB ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PcbState {
    /// A live entry exists. `reworks` is normally empty but may hold rows if
    /// a rework was logged without resolving the entry.
    Pending {
        entry: Entry,
        reworks: Vec<ReworkLogEntry>,
    },
    /// No live entry, at least one rework on record.
    Resolved { reworks: Vec<ReworkLogEntry> },
    Unknown,
}

impl PcbState {
    pub fn reworks(&self) -> &[ReworkLogEntry] {
        match self {
            PcbState::Pending { reworks, .. } | PcbState::Resolved { reworks } => {
                reworks.as_slice()
            }
            PcbState::Unknown => &[],
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PcbState::Pending { .. })
    }
}

/// What a submitted rework did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReworkOutcome {
    /// First rework: the live entry was deleted.
    Resolved(ReworkLogEntry),
    /// Re-rework of an already resolved PCB.
    Appended(ReworkLogEntry),
}

impl ReworkOutcome {
    pub fn row(&self) -> &ReworkLogEntry {
        match self {
            ReworkOutcome::Resolved(row) | ReworkOutcome::Appended(row) => row,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    store: Store,
}

impl Ledger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Log a rejected PCB as pending on behalf of `session`. Fails with
    /// `DuplicatePcb` while an entry for the same ID is still live.
    pub fn record_rejection(
        &self,
        session: &Session,
        pcb_id: &str,
        model: &str,
        rejection_stage: &str,
        rejection_details: &str,
    ) -> TrackerResult<Entry> {
        let pcb_id = require("PCB ID", pcb_id)?;
        let model = require("Model", model)?;
        let rejection_stage = require("Rejection stage", rejection_stage)?;
        let rejection_details = require("Rejection details", rejection_details)?;

        let entry = self.store.write(|tx| {
            if find_entry(tx, pcb_id)?.is_some() {
                return Err(TrackerError::DuplicatePcb(pcb_id.to_string()));
            }
            insert_entry(tx, pcb_id, model, now(), rejection_stage, rejection_details)
        })?;

        log::info!("{}", rejection_log_line(session, &entry));
        Ok(entry)
    }

    pub fn find_live_entry(&self, pcb_id: &str) -> TrackerResult<Option<Entry>> {
        self.store.read(|conn| find_entry(conn, pcb_id.trim()))
    }

    /// Rework history for one PCB in `rework_no` order.
    pub fn list_reworks(&self, pcb_id: &str) -> TrackerResult<Vec<ReworkLogEntry>> {
        self.store
            .read(|conn| fetch_reworks_for_pcb(conn, pcb_id.trim()))
    }

    pub fn rework_count(&self, pcb_id: &str) -> TrackerResult<i64> {
        self.store.read(|conn| count_reworks(conn, pcb_id.trim()))
    }

    /// Append a ledger row numbered one past the current highest for this
    /// PCB. Numbering and insert share a transaction, so two writers cannot
    /// hand out the same `rework_no`. Does not touch the live entry.
    pub fn record_rework(
        &self,
        pcb_id: &str,
        action_description: &str,
        performed_by: &str,
    ) -> TrackerResult<ReworkLogEntry> {
        let pcb_id = require("PCB ID", pcb_id)?;
        let action = require("Rework action", action_description)?;
        let row = self
            .store
            .write(|tx| append_rework(tx, pcb_id, action, performed_by))?;
        log::info!(
            "recorded rework #{} for {} by {}",
            row.rework_no,
            row.pcb_id,
            row.rework_done_by
        );
        Ok(row)
    }

    /// Delete the live entry for a PCB. Deleting an absent entry succeeds.
    pub fn resolve_entry(&self, pcb_id: &str) -> TrackerResult<()> {
        let pcb_id = pcb_id.trim();
        let removed = self.store.write(|tx| delete_entry(tx, pcb_id))?;
        if removed > 0 {
            log::info!("resolved entry for {pcb_id}");
        } else {
            log::debug!("no live entry to resolve for {pcb_id}");
        }
        Ok(())
    }

    /// Entry plus history for the rework form, read on one connection.
    pub fn lookup(&self, pcb_id: &str) -> TrackerResult<PcbState> {
        let pcb_id = pcb_id.trim();
        self.store.read(|conn| state_of(conn, pcb_id))
    }

    /// Submit a rework the way the rework form does: append the ledger row
    /// and, if the PCB was still pending, delete its entry. Both happen in a
    /// single transaction, so a failure leaves neither behind. Unknown PCB
    /// IDs are rejected with `NotFound`.
    pub fn submit_rework(
        &self,
        session: &Session,
        pcb_id: &str,
        action_description: &str,
    ) -> TrackerResult<ReworkOutcome> {
        let pcb_id = require("PCB ID", pcb_id)?;
        let action = require("Rework action", action_description)?;
        let performer = session.performer();

        let outcome = self.store.write(|tx| {
            let had_entry = find_entry(tx, pcb_id)?.is_some();
            if !had_entry && count_reworks(tx, pcb_id)? == 0 {
                return Err(TrackerError::NotFound(pcb_id.to_string()));
            }

            let row = append_rework(tx, pcb_id, action, performer)?;
            if had_entry {
                delete_entry(tx, pcb_id)?;
                Ok(ReworkOutcome::Resolved(row))
            } else {
                Ok(ReworkOutcome::Appended(row))
            }
        })?;

        match &outcome {
            ReworkOutcome::Resolved(row) => log::info!(
                "rework #{} resolved {} (by {})",
                row.rework_no,
                row.pcb_id,
                row.rework_done_by
            ),
            ReworkOutcome::Appended(row) => log::info!(
                "re-rework #{} appended for {} (by {})",
                row.rework_no,
                row.pcb_id,
                row.rework_done_by
            ),
        }
        Ok(outcome)
    }

    /// Every ledger row, for the log viewer and the spreadsheet backup.
    pub fn list_all_rework_logs(&self) -> TrackerResult<Vec<ReworkLogEntry>> {
        self.store.read(fetch_all_reworks)
    }

    pub fn list_entries(&self) -> TrackerResult<Vec<Entry>> {
        self.store.read(fetch_entries)
    }

    pub fn list_models(&self) -> TrackerResult<Vec<Model>> {
        self.store.read(fetch_models)
    }

    pub fn add_model(&self, session: &Session, name: &str) -> TrackerResult<Model> {
        session.require_admin("Adding a model")?;
        let name = require("Model name", name)?;
        let model = self.store.write(|tx| insert_model(tx, name))?;
        log::info!("model {} added by {}", model.name, session.username());
        Ok(model)
    }

    /// Remove all entries, rework history, and models. Operators are kept.
    pub fn clear_all_data(&self, session: &Session) -> TrackerResult<ClearedCounts> {
        session.require_admin("Clearing data")?;
        let counts = self.store.write(|tx| clear_all_data(tx))?;
        log::warn!(
            "{} cleared all data: {} entries, {} reworks, {} models",
            session.username(),
            counts.entries,
            counts.reworks,
            counts.models
        );
        Ok(counts)
    }
}

fn rejection_log_line(session: &Session, entry: &Entry) -> String {
    format!(
        "recorded rejection of {} ({}) at {}: {} (by {})",
        entry.pcb_id,
        entry.model,
        entry.rejection_stage,
        entry.rejection_details,
        session.performer()
    )
}

fn append_rework(
    conn: &Connection,
    pcb_id: &str,
    action: &str,
    performed_by: &str,
) -> TrackerResult<ReworkLogEntry> {
    let performed_by = match performed_by.trim() {
        "" => "unknown",
        name => name,
    };
    let rework_no = next_rework_no(conn, pcb_id)?;
    insert_rework(conn, pcb_id, rework_no, action, now(), performed_by)
}

fn state_of(conn: &Connection, pcb_id: &str) -> TrackerResult<PcbState> {
    let entry = find_entry(conn, pcb_id)?;
    let reworks = fetch_reworks_for_pcb(conn, pcb_id)?;
    Ok(match entry {
        Some(entry) => PcbState::Pending { entry, reworks },
        None if !reworks.is_empty() => PcbState::Resolved { reworks },
        None => PcbState::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::auth::tests::{admin_session, operator_session};

    fn ledger(dir: &TempDir) -> Ledger {
        let store = Store::new(dir.path().join("rework_data.db"));
        store.initialize().unwrap();
        Ledger::new(store)
    }

    fn clerk() -> Session {
        operator_session("clerk")
    }

    #[test]
    fn rejection_is_attributed_to_the_session() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let session = operator_session("op7");

        let entry = ledger
            .record_rejection(&session, "PCB001", "ModelX", "AOI", "SOLDER BRIDGE")
            .unwrap();
        let line = rejection_log_line(&session, &entry);
        assert!(line.contains("PCB001"));
        assert!(line.ends_with("(by op7)"));
    }

    #[test]
    fn concurrent_reworks_get_contiguous_numbers() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 25;

        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger
            .record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER")
            .unwrap();

        let failures: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|worker| {
                    let ledger = ledger.clone();
                    scope.spawn(move || {
                        let session = operator_session(&format!("op{worker}"));
                        let mut failures = 0;
                        for round in 0..PER_THREAD {
                            let result = if round % 2 == 0 {
                                ledger
                                    .submit_rework(&session, "PCB001", "Reflowed")
                                    .map(|_| ())
                            } else {
                                ledger
                                    .record_rework("PCB001", "Touched up", session.username())
                                    .map(|_| ())
                            };
                            if result.is_err() {
                                failures += 1;
                            }
                        }
                        failures
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).sum()
        });
        assert_eq!(failures, 0);

        let total = (THREADS * PER_THREAD) as i64;
        let numbers: Vec<i64> = ledger
            .list_reworks("PCB001")
            .unwrap()
            .into_iter()
            .map(|row| row.rework_no)
            .collect();
        assert_eq!(numbers, (1..=total).collect::<Vec<_>>());
        assert!(ledger.find_live_entry("PCB001").unwrap().is_none());
    }

    #[test]
    fn rejection_then_lookup() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        ledger
            .record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "SOLDER BRIDGE")
            .unwrap();
        let entry = ledger.find_live_entry("PCB001").unwrap().unwrap();
        assert_eq!(entry.pcb_id, "PCB001");
        assert_eq!(entry.model, "ModelX");
        assert_eq!(entry.rejection_stage, "AOI");
        assert_eq!(entry.rejection_details, "SOLDER BRIDGE");
    }

    #[test]
    fn duplicate_rejection_is_reported() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "PAD LIFT").unwrap();
        let err = ledger
            .record_rejection(&clerk(), "PCB001", "ModelY", "ICT", "OTHER")
            .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicatePcb(ref id) if id == "PCB001"));
        assert!(err.is_duplicate());
    }

    #[test]
    fn record_rework_numbers_sequentially() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        for n in 1..=3 {
            let row = ledger.record_rework("PCB009", &format!("try {n}"), "op1").unwrap();
            assert_eq!(row.rework_no, n);
        }
        assert_eq!(ledger.rework_count("PCB009").unwrap(), 3);
        let numbers: Vec<i64> = ledger
            .list_reworks("PCB009")
            .unwrap()
            .iter()
            .map(|row| row.rework_no)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn rework_numbering_is_per_pcb() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        ledger.record_rework("A", "x", "op1").unwrap();
        ledger.record_rework("A", "y", "op1").unwrap();
        let row = ledger.record_rework("B", "z", "op1").unwrap();
        assert_eq!(row.rework_no, 1);
    }

    #[test]
    fn blank_performer_is_recorded_as_unknown() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let row = ledger.record_rework("PCB001", "Reflowed", "  ").unwrap();
        assert_eq!(row.rework_done_by, "unknown");
    }

    #[test]
    fn resolve_entry_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        ledger.resolve_entry("PCB404").unwrap();
        ledger.resolve_entry("PCB404").unwrap();
    }

    #[test]
    fn submit_rework_resolves_pending_entry() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let session = operator_session("op1");

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "SOLDER BRIDGE").unwrap();
        let outcome = ledger
            .submit_rework(&session, "PCB001", "Reflowed joint")
            .unwrap();

        assert!(matches!(outcome, ReworkOutcome::Resolved(_)));
        assert_eq!(outcome.row().rework_done_by, "op1");
        assert!(ledger.find_live_entry("PCB001").unwrap().is_none());
        assert!(matches!(
            ledger.lookup("PCB001").unwrap(),
            PcbState::Resolved { ref reworks } if reworks.len() == 1
        ));
    }

    #[test]
    fn submit_rework_appends_after_resolution() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let session = admin_session();

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "SOLDER BRIDGE").unwrap();
        ledger.submit_rework(&session, "PCB001", "Reflowed joint").unwrap();
        let outcome = ledger.submit_rework(&session, "PCB001", "Replaced U3").unwrap();

        assert!(matches!(outcome, ReworkOutcome::Appended(_)));
        assert_eq!(outcome.row().rework_no, 2);
        assert_eq!(ledger.list_reworks("PCB001").unwrap().len(), 2);
    }

    #[test]
    fn submit_rework_rejects_unknown_pcb() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        let err = ledger
            .submit_rework(&operator_session("op1"), "GHOST", "Anything")
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(ledger.list_reworks("GHOST").unwrap().is_empty());
        assert_eq!(ledger.lookup("GHOST").unwrap(), PcbState::Unknown);
    }

    #[test]
    fn submit_rework_requires_action() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();

        let err = ledger
            .submit_rework(&operator_session("op1"), "PCB001", "   ")
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert!(ledger.find_live_entry("PCB001").unwrap().is_some());
    }

    #[test]
    fn rework_without_resolution_keeps_entry_pending() {
        // record_rework alone leaves the entry live; lookup reports it as
        // pending while still carrying the history.
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();
        ledger.record_rework("PCB001", "Cleaned flux", "op1").unwrap();

        let state = ledger.lookup("PCB001").unwrap();
        assert!(state.is_pending());
        assert_eq!(state.reworks().len(), 1);
    }

    #[test]
    fn rejection_allowed_again_after_resolution() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let session = operator_session("op1");

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();
        ledger.submit_rework(&session, "PCB001", "Fixed").unwrap();
        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "FCT", "DRY SOLDER").unwrap();

        let state = ledger.lookup("PCB001").unwrap();
        assert!(state.is_pending());
    }

    #[test]
    fn models_are_admin_only_and_unique() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let admin = admin_session();

        ledger.add_model(&admin, "ModelX").unwrap();
        assert!(ledger.add_model(&admin, "ModelX").unwrap_err().is_duplicate());
        assert!(matches!(
            ledger.add_model(&operator_session("op1"), "ModelY").unwrap_err(),
            TrackerError::Forbidden(_)
        ));
        assert_eq!(ledger.list_models().unwrap().len(), 1);
    }

    #[test]
    fn clear_all_data_wipes_everything_but_operators() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let admin = admin_session();

        ledger.add_model(&admin, "ModelX").unwrap();
        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();
        ledger.record_rejection(&clerk(), "PCB002", "ModelX", "AOI", "OTHER").unwrap();
        ledger.submit_rework(&admin, "PCB002", "Fixed").unwrap();

        assert!(ledger.clear_all_data(&operator_session("op1")).is_err());
        let counts = ledger.clear_all_data(&admin).unwrap();
        assert_eq!(
            counts,
            ClearedCounts {
                entries: 1,
                reworks: 1,
                models: 1
            }
        );
        assert!(ledger.list_entries().unwrap().is_empty());
        assert!(ledger.list_all_rework_logs().unwrap().is_empty());
    }
}
