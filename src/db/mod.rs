//! Persistence module split across logical submodules. Each function runs
//! one query against a borrowed connection; transactions are opened by
//! [`Store`] and the callers in `ledger.rs` / `auth.rs`.

mod connection;
mod entries;
mod maintenance;
mod operators;
mod product_models;
mod reports;
mod rework_log;

pub use connection::Store;
pub use entries::{delete_entry, fetch_entries, find_entry, insert_entry};
pub use maintenance::{clear_all_data, ClearedCounts};
pub use operators::{fetch_operators, fetch_password_hash, insert_operator};
pub use product_models::{fetch_models, insert_model};
pub use reports::{fetch_pending, fetch_reworked, fetch_status_overview};
pub use rework_log::{
    count_reworks, fetch_all_reworks, fetch_reworks_for_pcb, insert_rework, next_rework_no,
};
