//! hostkit: boots the shared host configuration.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Init logger at the configured level
//!   3. Load settings and seed the config store
//!   4. Print status and exit

use std::sync::Arc;

use hostkit::{logger, settings, ConfigStore, error::AppError};
use tracing::info;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present; ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let settings = settings::load()?;
    logger::init(&settings)?;

    let store = Arc::new(ConfigStore::from_settings(&settings)?);
    let namespaces = store.namespaces()?;

    info!(
        log_level = %settings.log_level,
        failure_policy = ?settings.failure_policy,
        namespaces = namespaces.len(),
        "config store ready"
    );
    println!("✓ Config loaded: namespaces=[{}]", namespaces.join(", "));

    Ok(())
}
