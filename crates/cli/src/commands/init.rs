//! `philovoid init` — write a starter configuration file.

use anyhow::{bail, Context};
use philovoid_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let path = AppConfig::default_path();
    if path.exists() {
        bail!("Config already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let starter = toml::to_string_pretty(&AppConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, starter)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    println!("Set your API key there, or export {}.", philovoid_config::API_KEY_ENV);
    Ok(())
}
