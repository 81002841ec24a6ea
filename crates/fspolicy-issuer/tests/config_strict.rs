#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use fspolicy_core::Call;
use fspolicy_issuer::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
apps:
  - key: "demo"
    secret: "s"
    alowed_calls: [read] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
apps:
  - key: "demo"
    secret: "s"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.apps[0].key, "demo");
    assert_eq!(cfg.apps[0].allowed_calls, Call::ALL.to_vec());
    assert_eq!(cfg.issuer.default_ttl_secs, 3600);
    assert_eq!(cfg.issuer.listen, "0.0.0.0:8080");
}

#[test]
fn calls_use_wire_spelling() {
    let ok = r#"
version: 1
apps:
  - key: "demo"
    secret_env: "DEMO_SECRET"
    allowed_calls: [writeUrl, stat]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.apps[0].allowed_calls, vec![Call::WriteUrl, Call::Stat]);

    let bad = ok.replace("writeUrl", "write_url");
    assert!(config::load_from_str(&bad).is_err());
}

#[test]
fn secret_is_redacted_in_debug() {
    let ok = r#"
version: 1
apps:
  - key: "demo"
    secret: "top-secret-value"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert!(!format!("{cfg:?}").contains("top-secret-value"));
}

#[test]
fn rejects_invalid_configs() {
    let cases = [
        ("wrong version", "version: 2\napps:\n  - key: a\n    secret: s\n"),
        ("no apps", "version: 1\napps: []\n"),
        ("no secret", "version: 1\napps:\n  - key: a\n"),
        (
            "both secrets",
            "version: 1\napps:\n  - key: a\n    secret: s\n    secret_env: E\n",
        ),
        ("empty key", "version: 1\napps:\n  - key: \"\"\n    secret: s\n"),
        (
            "duplicate key",
            "version: 1\napps:\n  - key: a\n    secret: s\n  - key: a\n    secret: t\n",
        ),
        (
            "empty allow-list",
            "version: 1\napps:\n  - key: a\n    secret: s\n    allowed_calls: []\n",
        ),
        (
            "ttl above max",
            "version: 1\nissuer:\n  default_ttl_secs: 7200\n  max_ttl_secs: 3600\napps:\n  - key: a\n    secret: s\n",
        ),
        (
            "max ttl above ceiling",
            "version: 1\nissuer:\n  max_ttl_secs: 9999999\napps:\n  - key: a\n    secret: s\n",
        ),
    ];

    for (name, yaml) in cases {
        let err = config::load_from_str(yaml).expect_err(name);
        assert_eq!(err.code(), "CONFIG", "case={name}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("/nonexistent/fspolicy.yaml").expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}
