//! Plugin config loader (strict parsing).

pub mod schema;

use std::fs;

use promhook_core::error::{PromError, Result};

pub use schema::{AuthConfig, HttpLabel, LabelsSection, PluginConfig, Toggle};

pub fn load_from_file(path: &str) -> Result<PluginConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PromError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PluginConfig> {
    let cfg: PluginConfig =
        serde_yaml::from_str(s).map_err(|e| PromError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
