//! Domain models that mirror the SQLite schema and get passed between the
//! ledger, the reporting views, and the TUI. They stay light-weight data
//! holders; lifecycle rules live in `ledger.rs`.

use std::fmt;

use chrono::{Local, NaiveDateTime, SubsecRound};

/// Rejection reasons offered by the entry form, in display order.
pub const REJECTION_REASONS: &[&str] = &[
    "COMPONENT DAMAGE",
    "MISALIGNMENT",
    "UPSIDE-DOWN COMPONENT",
    "WRONG COMPONENT",
    "BILLBOARD",
    "WRONG POLARITY",
    "COMPONENT SHIFT",
    "SOLDER BRIDGE",
    "EXCESS SOLDER",
    "LESS SOLDER",
    "SOLDER BALL",
    "COLD SOLDER",
    "DRY SOLDER",
    "PAD LIFT",
    "SOLDER CRACK",
    "INSUFFICIENT TROUGH HOLE",
    "OTHER",
];

/// Display format for every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time truncated to whole seconds so the stored text matches
/// `TIMESTAMP_FORMAT` exactly.
pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A board model offered in the entry form. Created by the admin and only
/// ever removed by the bulk clear.
pub struct Model {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A rejected PCB still waiting for its first rework. The row is deleted
/// once that rework is recorded, so its presence alone means "pending".
pub struct Entry {
    /// Auto-assigned serial number, also the natural display order.
    pub sr_no: i64,
    pub pcb_id: String,
    /// Model name as typed into the form; not a foreign key.
    pub model: String,
    pub timestamp: NaiveDateTime,
    pub rejection_stage: String,
    pub rejection_details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One append-only row of the rework ledger.
pub struct ReworkLogEntry {
    pub id: i64,
    pub pcb_id: String,
    /// 1-based sequence number scoped to `pcb_id`.
    pub rework_no: i64,
    pub rework_action: String,
    pub rework_date: NaiveDateTime,
    /// Operator username, the admin username, or `unknown`.
    pub rework_done_by: String,
}

impl ReworkLogEntry {
    /// `Rework 2: Reflowed joint (Date: ..., By: op1)` as shown in the
    /// rework form history.
    pub fn summary(&self) -> String {
        format!(
            "Rework {}: {} (Date: {}, By: {})",
            self.rework_no,
            self.rework_action,
            self.rework_date.format(TIMESTAMP_FORMAT),
            self.rework_done_by
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Registered operator. The password hash never leaves the store.
pub struct Operator {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Pending,
    Reworked,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "Pending"),
            ReportStatus::Reworked => write!(f, "Reworked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A row of the joined entry/rework report. The rework columns are empty for
/// pending entries, and `date` falls back to the entry timestamp.
pub struct ReportRow {
    pub sr_no: i64,
    pub pcb_id: String,
    pub model: String,
    pub rejection_details: String,
    pub status: ReportStatus,
    pub rework_no: Option<i64>,
    pub rework_done_by: Option<String>,
    pub date: NaiveDateTime,
    pub rework_action: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn rework_summary_matches_history_format() {
        let row = ReworkLogEntry {
            id: 1,
            pcb_id: "PCB001".into(),
            rework_no: 2,
            rework_action: "Reflowed joint".into(),
            rework_date: NaiveDate::from_ymd_opt(2024, 3, 5)
                .and_then(|d| d.and_hms_opt(14, 7, 9))
                .unwrap(),
            rework_done_by: "op1".into(),
        };
        assert_eq!(
            row.summary(),
            "Rework 2: Reflowed joint (Date: 2024-03-05 14:07:09, By: op1)"
        );
    }

    #[test]
    fn now_has_no_subsecond_component() {
        assert_eq!(now().and_utc().timestamp_subsec_nanos(), 0);
    }
}
