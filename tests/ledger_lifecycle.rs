//! End-to-end rework lifecycle through the public API: an operator logs a
//! rejected board, reworks it, and reworks it again after resolution.

use pcb_rework_tracker::models::ReportStatus;
use pcb_rework_tracker::{
    hash_password, AccessGate, AdminCredential, Ledger, PcbState, ReportKind, Reports,
    ReworkOutcome, Session, Store, TrackerError,
};
use tempfile::TempDir;

const COST: u32 = 4;

struct Fixture {
    _dir: TempDir,
    ledger: Ledger,
    reports: Reports,
    gate: AccessGate,
}

fn fixture() -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("data").join("rework_data.db"));
    assert!(store.initialize().unwrap());
    assert!(!store.initialize().unwrap());

    let admin = AdminCredential {
        username: "admin".into(),
        password_hash: Some(hash_password("floor-lead", COST).unwrap()),
    };
    Fixture {
        ledger: Ledger::new(store.clone()),
        reports: Reports::new(store.clone()),
        gate: AccessGate::new(store, admin, COST),
        _dir: dir,
    }
}

fn admin(fx: &Fixture) -> Session {
    fx.gate.login_admin("admin", "floor-lead").unwrap()
}

fn operator(fx: &Fixture, name: &str, password: &str) -> Session {
    fx.gate
        .register_operator(&admin(fx), name, password)
        .unwrap();
    fx.gate.login_operator(name, password).unwrap().unwrap()
}

#[test]
fn rejection_rework_and_re_rework() {
    let fx = fixture();
    let admin = admin(&fx);
    fx.ledger.add_model(&admin, "ModelX").unwrap();
    let op1 = operator(&fx, "op1", "secret");

    fx.ledger
        .record_rejection(&op1, "PCB001", "ModelX", "AOI", "SOLDER BRIDGE")
        .unwrap();
    let pending = fx.reports.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].pcb_id, "PCB001");
    assert!(fx.ledger.lookup("PCB001").unwrap().is_pending());

    let first = fx
        .ledger
        .submit_rework(&op1, "PCB001", "Removed bridge with wick")
        .unwrap();
    assert!(matches!(first, ReworkOutcome::Resolved(_)));
    assert_eq!(first.row().rework_no, 1);
    assert_eq!(first.row().rework_done_by, "op1");
    assert!(fx.ledger.find_live_entry("PCB001").unwrap().is_none());
    assert!(fx.reports.pending().unwrap().is_empty());

    let second = fx
        .ledger
        .submit_rework(&op1, "PCB001", "Touched up joint")
        .unwrap();
    assert!(matches!(second, ReworkOutcome::Appended(_)));
    assert_eq!(second.row().rework_no, 2);

    match fx.ledger.lookup("PCB001").unwrap() {
        PcbState::Resolved { reworks } => {
            let numbers: Vec<i64> = reworks.iter().map(|r| r.rework_no).collect();
            assert_eq!(numbers, vec![1, 2]);
            assert!(reworks[0]
                .summary()
                .starts_with("Rework 1: Removed bridge with wick (Date: "));
        }
        other => panic!("expected resolved state, got {other:?}"),
    }
    assert_eq!(fx.ledger.rework_count("PCB001").unwrap(), 2);
}

#[test]
fn unknown_pcb_is_rejected_without_writing() {
    let fx = fixture();
    let op1 = operator(&fx, "op1", "secret");

    assert_eq!(fx.ledger.lookup("PCB404").unwrap(), PcbState::Unknown);
    let err = fx
        .ledger
        .submit_rework(&op1, "PCB404", "Reflow")
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(fx.ledger.list_all_rework_logs().unwrap().is_empty());
}

#[test]
fn duplicates_surface_as_already_exists() {
    let fx = fixture();
    let admin = admin(&fx);

    fx.ledger
        .record_rejection(&admin, "PCB001", "ModelX", "AOI", "SOLDER BRIDGE")
        .unwrap();
    let err = fx
        .ledger
        .record_rejection(&admin, "PCB001", "ModelX", "ICT", "OTHER")
        .unwrap_err();
    assert!(matches!(err, TrackerError::DuplicatePcb(_)));

    fx.ledger.add_model(&admin, "ModelX").unwrap();
    assert!(fx.ledger.add_model(&admin, "ModelX").unwrap_err().is_duplicate());

    operator(&fx, "op1", "secret");
    assert!(fx
        .gate
        .register_operator(&admin, "op1", "other")
        .unwrap_err()
        .is_duplicate());
}

#[test]
fn wrong_credentials_do_not_open_a_session() {
    let fx = fixture();
    operator(&fx, "op1", "secret");

    assert!(fx.gate.login_operator("op1", "nope").unwrap().is_none());
    assert!(fx.gate.login_operator("ghost", "secret").unwrap().is_none());
    assert!(fx.gate.login_admin("admin", "secret").is_none());
}

#[test]
fn report_tabs_follow_the_lifecycle() {
    let fx = fixture();
    let op1 = operator(&fx, "op1", "secret");

    fx.ledger
        .record_rejection(&op1, "PCB001", "ModelX", "AOI", "SOLDER BRIDGE")
        .unwrap();
    fx.ledger
        .record_rejection(&op1, "PCB002", "ModelY", "FCT", "PAD LIFT")
        .unwrap();
    fx.ledger.submit_rework(&op1, "PCB001", "Fixed").unwrap();

    let pending = fx.reports.rows(ReportKind::Pending).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].pcb_id, "PCB002");
    assert_eq!(pending[0].status, ReportStatus::Pending);

    // Resolved boards no longer have a live entry, so the joined views skip them.
    assert!(fx.reports.rows(ReportKind::Reworked).unwrap().is_empty());
    let all = fx.reports.rows(ReportKind::All).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].pcb_id, "PCB002");
}

#[test]
fn clear_all_data_needs_admin_and_keeps_operators() {
    let fx = fixture();
    let admin = admin(&fx);
    let op1 = operator(&fx, "op1", "secret");
    fx.ledger.add_model(&admin, "ModelX").unwrap();
    fx.ledger
        .record_rejection(&op1, "PCB001", "ModelX", "AOI", "OTHER")
        .unwrap();
    fx.ledger.submit_rework(&op1, "PCB001", "Fixed").unwrap();
    fx.ledger
        .record_rejection(&op1, "PCB002", "ModelX", "AOI", "OTHER")
        .unwrap();

    assert!(matches!(
        fx.ledger.clear_all_data(&op1).unwrap_err(),
        TrackerError::Forbidden(_)
    ));

    let cleared = fx.ledger.clear_all_data(&admin).unwrap();
    assert_eq!(cleared.entries, 1);
    assert_eq!(cleared.reworks, 1);
    assert_eq!(cleared.models, 1);
    assert!(fx.ledger.list_entries().unwrap().is_empty());
    assert!(fx.ledger.list_models().unwrap().is_empty());
    assert_eq!(fx.gate.list_operators(&admin).unwrap().len(), 1);
    assert!(fx.gate.login_operator("op1", "secret").unwrap().is_some());
}
