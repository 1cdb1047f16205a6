use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{is_constraint_violation, StoreContext, TrackerError, TrackerResult};
use crate::models::Operator;

/// Store an operator with an already-hashed password.
pub fn insert_operator(
    conn: &Connection,
    username: &str,
    password_hash: &str,
) -> TrackerResult<Operator> {
    conn.execute(
        "INSERT INTO operators (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )
    .map_err(|err| {
        if is_constraint_violation(&err) {
            TrackerError::DuplicateUsername(username.to_string())
        } else {
            TrackerError::Store {
                action: "failed to insert operator",
                source: err,
            }
        }
    })?;

    Ok(Operator {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
    })
}

/// Hash stored for `username`, used only by the access gate.
pub fn fetch_password_hash(conn: &Connection, username: &str) -> TrackerResult<Option<String>> {
    conn.query_row(
        "SELECT password_hash FROM operators WHERE username = ?1",
        [username],
        |row| row.get(0),
    )
    .optional()
    .store_context("failed to look up operator")
}

pub fn fetch_operators(conn: &Connection) -> TrackerResult<Vec<Operator>> {
    let mut stmt = conn
        .prepare("SELECT id, username FROM operators ORDER BY username COLLATE NOCASE")
        .store_context("failed to prepare operators query")?;

    let operators = stmt
        .query_map([], |row| {
            Ok(Operator {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        })
        .store_context("failed to load operators")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect operators")?;

    Ok(operators)
}
