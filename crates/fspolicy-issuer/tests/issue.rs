#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{DateTime, TimeZone, Utc};

use fspolicy_core::codec;
use fspolicy_issuer::app_state::AppState;
use fspolicy_issuer::config;
use fspolicy_issuer::issue::{issue, IssueRequest};

const CONFIG: &str = r#"
version: 1
issuer:
  default_ttl_secs: 3600
  max_ttl_secs: 7200
apps:
  - key: "viewer"
    secret: "s3cr3t-app-key"
    allowed_calls: [read, stat]
    path: "/a/*"
  - key: "uploader"
    secret_env: "UPLOADER_SECRET"
    allowed_calls: [pick, store]
    container: "bucket/*"
"#;

fn state() -> AppState {
    let cfg = config::load_from_str(CONFIG).unwrap();
    AppState::with_env(cfg, |name| {
        (name == "UPLOADER_SECRET").then(|| "env-secret".to_string())
    })
    .unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_525_496_400, 0).single().unwrap()
}

fn request(app: &str) -> IssueRequest {
    IssueRequest {
        app: app.to_string(),
        ..Default::default()
    }
}

#[test]
fn issues_app_defaults_and_matches_core_vector() {
    // now + 3600 = 1525500000, calls default to [read, stat], path from app.
    let issued = issue(&state(), &request("viewer"), now()).unwrap();

    assert_eq!(issued.expiry, 1_525_500_000);
    assert_eq!(
        issued.policy,
        "eyJleHBpcnkiOjE1MjU1MDAwMDAsImNhbGwiOlsicmVhZCIsInN0YXQiXSwicGF0aCI6Ii9hLyoifQ=="
    );
    assert_eq!(
        issued.signature,
        "c101055b087caa9db039e3dd13ecb4085a818b206e000b292d46989debc4adef"
    );
    assert_eq!(
        issued.query,
        format!("policy={}&signature={}", issued.policy, issued.signature)
    );
}

#[test]
fn env_secret_is_used() {
    let mut req = request("uploader");
    req.call = vec!["store".into()];
    let issued = issue(&state(), &req, now()).unwrap();
    assert_eq!(
        issued.signature,
        codec::sign(&issued.policy, "env-secret").unwrap()
    );
}

#[test]
fn missing_env_secret_fails_startup() {
    let cfg = config::load_from_str(CONFIG).unwrap();
    let err = AppState::with_env(cfg, |_| None).err().expect("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn unknown_app_is_rejected() {
    let err = issue(&state(), &request("nobody"), now()).unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_APP");
    assert_eq!(err.status().as_u16(), 404);
}

#[test]
fn calls_outside_allow_list_are_not_allowed() {
    let mut req = request("viewer");
    req.call = vec!["read".into(), "remove".into()];
    let err = issue(&state(), &req, now()).unwrap_err();
    assert_eq!(err.code(), "NOT_ALLOWED");
    assert!(err.to_string().contains("remove"));
    assert_eq!(err.status().as_u16(), 403);
}

#[test]
fn unknown_calls_surface_the_core_error() {
    let mut req = request("viewer");
    req.call = vec!["fly".into()];
    let err = issue(&state(), &req, now()).unwrap_err();
    assert_eq!(err.code(), "INVALID_CALL_LIST");
    assert_eq!(err.status().as_u16(), 400);
}

#[test]
fn ttl_is_bounded() {
    let mut req = request("viewer");
    req.ttl_secs = Some(7201);
    assert_eq!(issue(&state(), &req, now()).unwrap_err().code(), "BAD_REQUEST");

    req.ttl_secs = Some(0);
    assert_eq!(issue(&state(), &req, now()).unwrap_err().code(), "BAD_REQUEST");

    req.ttl_secs = Some(60);
    let issued = issue(&state(), &req, now()).unwrap();
    assert_eq!(issued.expiry, 1_525_496_460);
}

#[test]
fn request_fields_override_defaults_in_canonical_order() {
    let mut req = request("uploader");
    req.call = vec!["pick".into()];
    req.handle = Some("FooBarBaz".into());
    req.container = Some("other/*".into());
    req.min_size = Some(serde_json::json!(128));
    req.max_size = Some(serde_json::json!("1024000"));

    let issued = issue(&state(), &req, now()).unwrap();
    let policy = fspolicy_core::Policy::new([
        ("expiry", 1_525_500_000i64.into()),
        ("call", vec!["pick"].into()),
        ("handle", "FooBarBaz".into()),
        ("container", "other/*".into()),
        ("minSize", 128i64.into()),
        ("maxSize", "1024000".into()),
    ])
    .unwrap();
    assert_eq!(issued.policy, policy.encoded());
}
