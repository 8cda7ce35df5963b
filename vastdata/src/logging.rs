//! Log subscriber setup for hosts embedding the provider

use tracing::Level;

pub const LOG_LEVEL_ENV: &str = "TF_LOG";

/// Level named by `TF_LOG`, INFO when unset or unrecognised
pub fn level_from_env() -> Level {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Installs the global fmt subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_from_env())
        .with_target(false)
        .try_init();
}
