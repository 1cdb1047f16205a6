//! Core library surface for the PCB rework tracker.
//!
//! The ledger, the access gate and the report views are plain library types
//! over a SQLite [`Store`]; the `bin` target only wires them to the terminal
//! UI. Integration tests drive the same types directly.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod reports;
pub mod ui;

/// Credential checks and the session value that authorizes mutations.
pub use auth::{hash_password, AccessGate, AdminCredential, Role, Session};

pub use config::Config;
pub use db::{ClearedCounts, Store};
pub use error::{TrackerError, TrackerResult};

/// The rework lifecycle and its read-only views.
pub use ledger::{Ledger, PcbState, ReworkOutcome};
pub use reports::{ReportKind, Reports};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
