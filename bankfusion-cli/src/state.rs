//! Per-user files under `~/.bankfusion`

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const HOME_DIR: &str = ".bankfusion";
pub const CONFIG_FILE: &str = "config.toml";
pub const AUTH_FILE: &str = "auth.json";

/// `~/.bankfusion`; callers that write into it create it themselves
pub fn bankfusion_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(HOME_DIR))
}
