use rusqlite::Connection;

use crate::error::{is_constraint_violation, StoreContext, TrackerError, TrackerResult};
use crate::models::Model;

/// Insert a new model name, returning the hydrated struct so the caller can
/// refresh the picker without re-querying.
pub fn insert_model(conn: &Connection, name: &str) -> TrackerResult<Model> {
    conn.execute("INSERT INTO models (model_name) VALUES (?1)", [name])
        .map_err(|err| map_unique_constraint(err, name))?;

    Ok(Model {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// All model names, case-insensitively sorted for the entry form picker.
pub fn fetch_models(conn: &Connection) -> TrackerResult<Vec<Model>> {
    let mut stmt = conn
        .prepare("SELECT id, model_name FROM models ORDER BY model_name COLLATE NOCASE")
        .store_context("failed to prepare models query")?;

    let models = stmt
        .query_map([], |row| {
            Ok(Model {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .store_context("failed to load models")?
        .collect::<Result<Vec<_>, _>>()
        .store_context("failed to collect models")?;

    Ok(models)
}

fn map_unique_constraint(err: rusqlite::Error, name: &str) -> TrackerError {
    if is_constraint_violation(&err) {
        TrackerError::DuplicateModel(name.to_string())
    } else {
        TrackerError::Store {
            action: "failed to insert model",
            source: err,
        }
    }
}
