//! fspolicy issuer
//!
//! - `POST /v1/policy` : issue a signed policy for a configured app
//! - `GET /healthz`    : liveness

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use fspolicy_issuer::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("FSPOLICY_CONFIG").unwrap_or_else(|_| config::DEFAULT_PATH.into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .issuer
        .listen
        .parse()
        .expect("issuer.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("app state init failed");
    let apps = state.app_count();
    let app = router::build_router(state);

    tracing::info!(%listen, apps, "fspolicy-issuer starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
