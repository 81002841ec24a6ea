use std::collections::HashSet;

use fspolicy_core::{Call, Secret};
use serde::Deserialize;

use crate::error::{IssueError, Result};

/// Upper bound for `issuer.max_ttl_secs` (one week).
pub const TTL_CEILING_SECS: u64 = 604_800;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerConfig {
    pub version: u32,

    #[serde(default)]
    pub issuer: IssuerSection,

    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

impl IssuerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(IssueError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.apps.is_empty() {
            return Err(IssueError::Config("apps must not be empty".into()));
        }

        self.issuer.validate()?;

        let mut seen = HashSet::new();
        for app in &self.apps {
            app.validate()?;
            if !seen.insert(app.key.as_str()) {
                return Err(IssueError::Config(format!("duplicate app key: {}", app.key)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,
}

impl Default for IssuerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            default_ttl_secs: default_ttl_secs(),
            max_ttl_secs: default_max_ttl_secs(),
        }
    }
}

impl IssuerSection {
    pub fn validate(&self) -> Result<()> {
        if !(60..=TTL_CEILING_SECS).contains(&self.max_ttl_secs) {
            return Err(IssueError::Config(format!(
                "issuer.max_ttl_secs must be between 60 and {TTL_CEILING_SECS}"
            )));
        }
        if !(60..=self.max_ttl_secs).contains(&self.default_ttl_secs) {
            return Err(IssueError::Config(
                "issuer.default_ttl_secs must be between 60 and max_ttl_secs".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_max_ttl_secs() -> u64 {
    86400
}

/// One application allowed to request policies, with its signing secret.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub key: String,

    /// Inline secret. Exactly one of `secret` / `secret_env` must be set.
    #[serde(default)]
    pub secret: Option<Secret>,

    /// Name of the environment variable holding the secret.
    #[serde(default)]
    pub secret_env: Option<String>,

    #[serde(default = "default_allowed_calls")]
    pub allowed_calls: Vec<Call>,

    /// Default `path` when a request does not name one.
    #[serde(default)]
    pub path: Option<String>,

    /// Default `container` when a request does not name one.
    #[serde(default)]
    pub container: Option<String>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(IssueError::Config("app key must not be empty".into()));
        }
        match (&self.secret, &self.secret_env) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(IssueError::Config(format!(
                    "app {}: exactly one of secret / secret_env is required",
                    self.key
                )))
            }
        }
        if self.allowed_calls.is_empty() {
            return Err(IssueError::Config(format!(
                "app {}: allowed_calls must not be empty",
                self.key
            )));
        }
        Ok(())
    }
}

fn default_allowed_calls() -> Vec<Call> {
    Call::ALL.to_vec()
}
