//! Shared application state for the issuer.
//!
//! Secrets are resolved once at startup (inline or from the environment);
//! a missing variable is a startup error, not a per-request one.

use std::collections::HashMap;
use std::sync::Arc;

use fspolicy_core::{Call, Secret};

use crate::config::{IssuerConfig, IssuerSection};
use crate::error::{IssueError, Result};

/// Per-app runtime: resolved secret and issuance defaults.
#[derive(Debug)]
pub struct AppRuntime {
    pub key: String,
    secret: Secret,
    pub allowed_calls: Vec<Call>,
    pub path: Option<String>,
    pub container: Option<String>,
}

impl AppRuntime {
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn allows(&self, call: Call) -> bool {
        self.allowed_calls.contains(&call)
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: IssuerConfig,
    apps: HashMap<String, Arc<AppRuntime>>,
}

impl AppState {
    /// Build application state, reading `secret_env` variables from the process
    /// environment.
    pub fn new(cfg: IssuerConfig) -> Result<Self> {
        Self::with_env(cfg, |name| std::env::var(name).ok())
    }

    /// Same as [`AppState::new`] with an explicit environment lookup.
    pub fn with_env(cfg: IssuerConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut apps = HashMap::new();
        for a in &cfg.apps {
            let secret = match (&a.secret, &a.secret_env) {
                (Some(s), _) => s.clone(),
                (None, Some(var)) => env(var.as_str()).map(Secret::new).ok_or_else(|| {
                    IssueError::Config(format!(
                        "app {}: environment variable {var} is not set",
                        a.key
                    ))
                })?,
                (None, None) => {
                    return Err(IssueError::Config(format!("app {}: no secret", a.key)))
                }
            };

            let runtime = AppRuntime {
                key: a.key.clone(),
                secret,
                allowed_calls: a.allowed_calls.clone(),
                path: a.path.clone(),
                container: a.container.clone(),
            };
            tracing::debug!(app = %a.key, calls = ?runtime.allowed_calls, "app registered");
            apps.insert(a.key.clone(), Arc::new(runtime));
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, apps }),
        })
    }

    pub fn issuer(&self) -> &IssuerSection {
        &self.inner.cfg.issuer
    }

    pub fn app(&self, key: &str) -> Option<Arc<AppRuntime>> {
        self.inner.apps.get(key).cloned()
    }

    pub fn app_count(&self) -> usize {
        self.inner.apps.len()
    }
}
