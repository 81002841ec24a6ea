//! Policy issuance.
//!
//! `issue` is the pure rule set (clock injected); `issue_policy` is the axum
//! handler around it. The signed result is handed back as separate fields and
//! as a ready `policy=...&signature=...` query tail.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use fspolicy_core::{Call, OptionKey, OptionValue, Policy};

use crate::app_state::AppState;
use crate::error::{IssueError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueRequest {
    pub app: String,
    /// Requested calls; empty means everything the app may grant.
    #[serde(default)]
    pub call: Vec<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// String or integer.
    #[serde(default)]
    pub min_size: Option<Value>,
    /// String or integer.
    #[serde(default)]
    pub max_size: Option<Value>,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedPolicy {
    pub policy: String,
    pub signature: String,
    /// Unix epoch seconds.
    pub expiry: i64,
    pub query: String,
}

impl IssuedPolicy {
    fn from_signed(policy: &Policy, signature: String) -> Self {
        Self {
            query: format!("policy={}&signature={}", policy.encoded(), signature),
            policy: policy.encoded().to_string(),
            signature,
            expiry: policy.expiry().timestamp(),
        }
    }
}

pub fn issue(state: &AppState, req: &IssueRequest, now: DateTime<Utc>) -> Result<IssuedPolicy> {
    let app = state
        .app(&req.app)
        .ok_or_else(|| IssueError::UnknownApp(req.app.clone()))?;

    let issuer = state.issuer();
    let ttl = req.ttl_secs.unwrap_or(issuer.default_ttl_secs);
    if ttl == 0 || ttl > issuer.max_ttl_secs {
        return Err(IssueError::BadRequest(format!(
            "ttl_secs must be between 1 and {}",
            issuer.max_ttl_secs
        )));
    }
    let expiry = now + Duration::seconds(ttl as i64);

    let calls: Vec<String> = if req.call.is_empty() {
        app.allowed_calls.iter().map(|c| c.as_str().to_string()).collect()
    } else {
        req.call.clone()
    };

    let mut builder = Policy::builder()
        .expiry(expiry)
        .option(OptionKey::Call, calls);
    if let Some(handle) = &req.handle {
        builder = builder.handle(handle.as_str());
    }
    if let Some(path) = req.path.as_ref().or(app.path.as_ref()) {
        builder = builder.path(path.as_str());
    }
    if let Some(container) = req.container.as_ref().or(app.container.as_ref()) {
        builder = builder.container(container.as_str());
    }
    if let Some(url) = &req.url {
        builder = builder.url(url.as_str());
    }
    if let Some(size) = &req.min_size {
        builder = builder.min_size(OptionValue::from(size.clone()));
    }
    if let Some(size) = &req.max_size {
        builder = builder.max_size(OptionValue::from(size.clone()));
    }
    let policy = builder.build()?;

    let denied: Vec<Call> = policy
        .calls()
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|c| !app.allows(*c))
        .collect();
    if !denied.is_empty() {
        let names: Vec<&str> = denied.iter().map(|c| c.as_str()).collect();
        tracing::warn!(app = %app.key, denied = ?names, "calls outside app allow-list");
        return Err(IssueError::NotAllowed(format!(
            "app {} may not grant: {}",
            app.key,
            names.join(", ")
        )));
    }

    let signature = policy.sign(app.secret().expose_secret())?;
    tracing::info!(
        app = %app.key,
        calls = ?policy.calls(),
        expiry = policy.expiry().timestamp(),
        "policy issued"
    );
    Ok(IssuedPolicy::from_signed(&policy, signature))
}

/// Body rejections (malformed JSON, unknown fields, missing `app`, wrong
/// content type) answer with the same `{code,msg}` shape as issuance errors.
pub async fn issue_policy(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssuedPolicy>> {
    let Json(req) = payload?;
    issue(&state, &req, Utc::now()).map(Json)
}
