mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use testbench_common::config::HarnessConfig;
use testbench_harness::reports::{HttpReportSink, ReportSink};
use testbench_harness::BatchRunner;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

pub type SharedRunner = Arc<Mutex<BatchRunner>>;

pub struct AppState {
    pub config: HarnessConfig,
    pub http: Client,
    /// One harness per logged-in session
    pub sessions: RwLock<HashMap<Uuid, SharedRunner>>,
    pub reports: Option<Arc<dyn ReportSink>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: HarnessConfig) -> Self {
        let http = Client::new();
        let reports = config
            .reports_endpoint
            .clone()
            .map(|endpoint| Arc::new(HttpReportSink::new(http.clone(), endpoint)) as Arc<dyn ReportSink>);

        Self {
            config,
            http,
            sessions: RwLock::new(HashMap::new()),
            reports,
            started_at: Utc::now(),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").map(|format| format == "json").unwrap_or(false) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Testbench API booting...");

    let config = HarnessConfig::load_default().context("Failed to load harness config")?;
    info!(
        piston_url = %config.piston_url,
        cooldown_seconds = config.cooldown_seconds,
        batch_delay_ms = config.batch_delay_ms,
        "Harness config loaded"
    );

    let addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .merge(routes::routes())
        .with_state(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
