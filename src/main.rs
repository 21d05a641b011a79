// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use coffer::api::router;
use coffer::config::Config;
use coffer::state::AppState;
use coffer::storage::{MetadataDb, StoragePaths};

/// Grace period before the startup sweep reaps fileless pending item rows.
const RECONCILE_GRACE_MINUTES: i64 = 5;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env();

    std::fs::create_dir_all(&config.storage_root).expect("Failed to create storage root");
    let db = MetadataDb::open(&config.database_path).expect("Failed to open metadata database");
    let paths = StoragePaths::new(&config.storage_root);
    let state = AppState::new(db, paths, config.auth.clone());

    // Reap leftovers of interrupted uploads before serving traffic.
    match state
        .items()
        .reconcile(chrono::Duration::minutes(RECONCILE_GRACE_MINUTES))
    {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "reconciled stale pending items"),
        Err(e) => tracing::warn!(error = %e, "reconciliation sweep failed"),
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!("Coffer listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
