//! Spreadsheet backup of the rework ledger: one row per rework, written to a
//! date-partitioned folder under the backup root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::auth::Session;
use crate::ledger::Ledger;
use crate::models::{ReworkLogEntry, TIMESTAMP_FORMAT};

pub const SHEET_NAME: &str = "Rework Log";

pub const HEADERS: [&str; 6] = [
    "Id",
    "PCB ID",
    "Rework No",
    "Rework Action",
    "Rework Date",
    "Rework Done By",
];

/// `root/YYYY-MM-DD/backup_YYYYmmdd_HHMMSS.xlsx`
pub fn backup_path(root: &Path, at: NaiveDateTime) -> PathBuf {
    root.join(at.format("%Y-%m-%d").to_string())
        .join(format!("backup_{}.xlsx", at.format("%Y%m%d_%H%M%S")))
}

/// Export every ledger row. Admin only.
pub fn take_backup(
    ledger: &Ledger,
    session: &Session,
    root: &Path,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    session.require_admin("Taking a backup")?;
    let rows = ledger
        .list_all_rework_logs()
        .context("failed to read rework log")?;

    let path = backup_path(root, at);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create backup directory")?;
    }
    write_rework_workbook(&path, &rows)?;

    log::info!(
        "{} exported {} rework rows to {}",
        session.username(),
        rows.len(),
        path.display()
    );
    Ok(path)
}

pub fn write_rework_workbook(path: &Path, rows: &[ReworkLogEntry]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        write_headers(sheet, &header_format)?;

        let mut row: u32 = 1;
        for rework in rows {
            sheet.write_number(row, 0, rework.id as f64)?;
            sheet.write_string(row, 1, &rework.pcb_id)?;
            sheet.write_number(row, 2, rework.rework_no as f64)?;
            sheet.write_string(row, 3, &rework.rework_action)?;
            sheet.write_string(
                row,
                4,
                rework.rework_date.format(TIMESTAMP_FORMAT).to_string(),
            )?;
            sheet.write_string(row, 5, &rework.rework_done_by)?;
            row += 1;
        }
        sheet.autofit();
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save backup {}", path.display()))
}

fn write_headers(sheet: &mut Worksheet, format: &Format) -> Result<(), XlsxError> {
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    Ok(())
}
