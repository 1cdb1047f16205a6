//! Ratatui front-end. `App` owns the screen/mode state machine and calls into
//! the ledger, the access gate and the report views; `terminal` runs the
//! crossterm event loop around it.
mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
