//! Issuer config loader (strict parsing).

pub mod schema;

use std::fs;

use crate::error::{IssueError, Result};

pub use schema::{AppConfig, IssuerConfig, IssuerSection};

/// Used when `FSPOLICY_CONFIG` is unset.
pub const DEFAULT_PATH: &str = "fspolicy.yaml";

pub fn load_from_file(path: &str) -> Result<IssuerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| IssueError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<IssuerConfig> {
    let cfg: IssuerConfig = serde_yaml::from_str(s)
        .map_err(|e| IssueError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
