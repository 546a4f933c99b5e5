//! orpheus - terminal front end for the synth
//!
//! Run with: cargo run
//! Logs go to `orpheus.log` when `ORPHEUS_LOG` is set (e.g. `ORPHEUS_LOG=debug`).

mod app;
mod ui;

use std::fs::File;
use std::sync::Mutex;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::Orpheus;

const LOG_ENV: &str = "ORPHEUS_LOG";
const LOG_FILE: &str = "orpheus.log";

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;
    Orpheus::new().run()
}

/// The terminal belongs to the UI, so logs only ever go to a file.
fn init_logging() -> EyreResult<()> {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return Ok(());
    };
    let file = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {LOG_FILE}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
