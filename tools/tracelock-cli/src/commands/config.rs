//! Show or initialize the app config file.

use anyhow::Context;
use tracelock_common::config::{config_file_path, AppConfig};

pub fn run(app: &AppConfig, init: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    if init {
        app.save()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote app config");
    }

    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not present, using defaults)");
    }
    println!("{}", serde_json::to_string_pretty(app)?);
    Ok(())
}
