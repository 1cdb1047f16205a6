//! Read-only aggregate views over entries and the rework ledger.

use crate::db::{fetch_entries, fetch_pending, fetch_reworked, fetch_status_overview, Store};
use crate::error::TrackerResult;
use crate::models::{Entry, ReportRow, ReportStatus};

/// Which aggregate the report screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Pending,
    Reworked,
    All,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Pending => "Pending Rework",
            ReportKind::Reworked => "Reworked",
            ReportKind::All => "All Entries",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ReportKind::Pending => ReportKind::Reworked,
            ReportKind::Reworked => ReportKind::All,
            ReportKind::All => ReportKind::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reports {
    store: Store,
}

impl Reports {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Live entries with no rework rows, newest first.
    pub fn pending(&self) -> TrackerResult<Vec<Entry>> {
        self.store.read(fetch_pending)
    }

    /// Live entries that also have rework rows, by PCB then rework number.
    pub fn reworked(&self) -> TrackerResult<Vec<ReportRow>> {
        self.store.read(fetch_reworked)
    }

    pub fn status_overview(&self) -> TrackerResult<Vec<ReportRow>> {
        self.store.read(fetch_status_overview)
    }

    pub fn entries(&self) -> TrackerResult<Vec<Entry>> {
        self.store.read(fetch_entries)
    }

    /// Rows for `kind`, with pending entries lifted into report rows so the
    /// screen can render every tab with one table.
    pub fn rows(&self, kind: ReportKind) -> TrackerResult<Vec<ReportRow>> {
        match kind {
            ReportKind::Pending => Ok(self
                .pending()?
                .into_iter()
                .map(|entry| ReportRow {
                    sr_no: entry.sr_no,
                    pcb_id: entry.pcb_id,
                    model: entry.model,
                    rejection_details: entry.rejection_details,
                    status: ReportStatus::Pending,
                    rework_no: None,
                    rework_done_by: None,
                    date: entry.timestamp,
                    rework_action: None,
                })
                .collect()),
            ReportKind::Reworked => self.reworked(),
            ReportKind::All => self.status_overview(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::auth::tests::operator_session;
    use crate::auth::Session;
    use crate::ledger::Ledger;

    fn clerk() -> Session {
        operator_session("clerk")
    }

    fn setup(dir: &TempDir) -> (Ledger, Reports) {
        let store = Store::new(dir.path().join("rework_data.db"));
        store.initialize().unwrap();
        (Ledger::new(store.clone()), Reports::new(store))
    }

    #[test]
    fn pending_lists_unreworked_entries_newest_first() {
        let dir = TempDir::new().unwrap();
        let (ledger, reports) = setup(&dir);

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();
        ledger.record_rejection(&clerk(), "PCB002", "ModelX", "AOI", "OTHER").unwrap();
        ledger.record_rejection(&clerk(), "PCB003", "ModelX", "AOI", "OTHER").unwrap();
        ledger
            .submit_rework(&operator_session("op1"), "PCB002", "Fixed")
            .unwrap();

        let ids: Vec<String> = reports
            .pending()
            .unwrap()
            .into_iter()
            .map(|e| e.pcb_id)
            .collect();
        assert_eq!(ids, vec!["PCB003", "PCB001"]);
    }

    #[test]
    fn resolved_pcbs_do_not_appear_in_reworked_view() {
        let dir = TempDir::new().unwrap();
        let (ledger, reports) = setup(&dir);

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();
        ledger
            .submit_rework(&operator_session("op1"), "PCB001", "Fixed")
            .unwrap();

        assert!(reports.reworked().unwrap().is_empty());
        assert!(reports.status_overview().unwrap().is_empty());
    }

    #[test]
    fn unresolved_rework_surfaces_as_reworked() {
        // A rework logged without resolving the entry shows up as Reworked
        // while the entry is still returned as live.
        let dir = TempDir::new().unwrap();
        let (ledger, reports) = setup(&dir);

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "SOLDER BALL").unwrap();
        ledger.record_rejection(&clerk(), "PCB002", "ModelX", "AOI", "PAD LIFT").unwrap();
        ledger.record_rework("PCB001", "Removed ball", "op1").unwrap();

        let reworked = reports.reworked().unwrap();
        assert_eq!(reworked.len(), 1);
        assert_eq!(reworked[0].pcb_id, "PCB001");
        assert_eq!(reworked[0].status, ReportStatus::Reworked);
        assert_eq!(reworked[0].rework_action.as_deref(), Some("Removed ball"));
        assert!(ledger.find_live_entry("PCB001").unwrap().is_some());

        let overview = reports.status_overview().unwrap();
        let statuses: Vec<(String, ReportStatus)> = overview
            .into_iter()
            .map(|row| (row.pcb_id, row.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("PCB001".to_string(), ReportStatus::Reworked),
                ("PCB002".to_string(), ReportStatus::Pending),
            ]
        );

        let pending = reports.rows(ReportKind::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].pcb_id, "PCB002");
        assert!(pending[0].rework_no.is_none());
    }

    #[test]
    fn re_rejected_pcb_reports_as_reworked_with_earlier_history() {
        // Joins key on pcb_id alone, so a board rejected again after being
        // resolved carries its earlier rework rows: it leaves the Pending tab
        // and lists under Reworked until the new entry is resolved.
        let dir = TempDir::new().unwrap();
        let (ledger, reports) = setup(&dir);
        let op1 = operator_session("op1");

        ledger.record_rejection(&clerk(), "PCB001", "ModelX", "AOI", "OTHER").unwrap();
        ledger.submit_rework(&op1, "PCB001", "First fix").unwrap();
        ledger
            .record_rejection(&clerk(), "PCB001", "ModelX", "FCT", "DRY SOLDER")
            .unwrap();

        assert!(ledger.lookup("PCB001").unwrap().is_pending());
        assert!(reports.pending().unwrap().is_empty());

        let reworked = reports.reworked().unwrap();
        assert_eq!(reworked.len(), 1);
        assert_eq!(reworked[0].rejection_details, "DRY SOLDER");
        assert_eq!(reworked[0].rework_no, Some(1));
        assert_eq!(reworked[0].rework_action.as_deref(), Some("First fix"));
        assert_eq!(reworked[0].status, ReportStatus::Reworked);

        ledger.submit_rework(&op1, "PCB001", "Second fix").unwrap();
        assert!(reports.reworked().unwrap().is_empty());
        assert_eq!(ledger.rework_count("PCB001").unwrap(), 2);
    }

    #[test]
    fn report_kind_cycles_through_all_tabs() {
        assert_eq!(ReportKind::Pending.next(), ReportKind::Reworked);
        assert_eq!(ReportKind::Reworked.next(), ReportKind::All);
        assert_eq!(ReportKind::All.next(), ReportKind::Pending);
    }
}
