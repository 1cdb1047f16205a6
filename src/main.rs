//! Binary entry point: load the config, start file logging, bring up the
//! SQLite store, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use pcb_rework_tracker::{logging, run_app, AccessGate, App, Config, Ledger, Reports, Store};

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let log_path = logging::init(&config)?;

    let store = Store::new(config.database_path()?);
    let created = store
        .initialize()
        .with_context(|| format!("failed to open database {}", store.path().display()))?;
    log::info!(
        "starting with database {} (new: {created}), logging to {}",
        store.path().display(),
        log_path.display()
    );

    let ledger = Ledger::new(store.clone());
    let reports = Reports::new(store.clone());
    let gate = AccessGate::new(store, config.admin_credential(), config.bcrypt_cost);

    let mut app = App::new(config, ledger, reports, gate);
    let result = run_app(&mut app);
    if let Err(err) = &result {
        log::error!("terminal session ended with an error: {err:#}");
    }
    result
}
