// Copyright (c) 2025 Tipstream Contributors

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;

pub fn run(config_path: &Path) -> Result<()> {
    if Config::exists(config_path) {
        bail!("Config already exists at {}", config_path.display());
    }

    let config = Config::default();
    config.save(config_path)?;

    println!("Wrote config to {}", config_path.display());
    println!("Data directory: {}", config.data.dir.display());
    println!("Edit [peers] to point at the fraud and notification services.");
    Ok(())
}
