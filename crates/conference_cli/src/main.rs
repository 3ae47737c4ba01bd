//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `conference_core` linkage, configuration and store bootstrap.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `conference_cli [config.json]`. Without an argument the
//! `CONFERENCE_*` environment variables are used.

use conference_core::db::migrations::current_user_version;
use conference_core::db::open_db_with_options;
use conference_core::{core_version, init_logging_from_config, CoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("conference_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::load(path),
        None => CoreConfig::from_env(),
    }
    .map_err(|err| err.to_string())?;

    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let conn = open_db_with_options(&config.db_path, config.open_options())
        .map_err(|err| err.to_string())?;
    let schema_version = current_user_version(&conn).map_err(|err| err.to_string())?;
    log::info!(
        "event=cli_smoke module=cli status=ok schema_version={}",
        schema_version
    );

    println!("conference_core version={}", core_version());
    println!("conference_core db={}", config.db_path.display());
    println!("conference_core schema_version={schema_version}");
    Ok(())
}
