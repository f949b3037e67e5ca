// src/main.rs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use assessment_portal::config::Config;
use assessment_portal::routes;
use assessment_portal::sheets::google::{GoogleSheetsClient, ServiceAccountKey, TokenSource};
use assessment_portal::sheets::{SheetStore, Table};
use assessment_portal::state::AppState;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env().context("invalid configuration")?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store = build_store(&config).context("failed to set up the spreadsheet client")?;
    tracing::info!(
        "Spreadsheet client ready (students={}, questions={}, responses={})",
        config.students_sheet.spreadsheet_id,
        config.questions_sheet.spreadsheet_id,
        config.responses_sheet.spreadsheet_id
    );

    let addr = config.bind_addr;
    let state = AppState::new(store, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn SheetStore>> {
    let auth = match (&config.service_account_file, &config.sheets_access_token) {
        (Some(path), _) => TokenSource::ServiceAccount(ServiceAccountKey::from_file(path)?),
        (None, Some(token)) => TokenSource::Static(token.clone()),
        (None, None) => anyhow::bail!("no spreadsheet credentials configured"),
    };

    let locations = HashMap::from([
        (Table::Students, config.students_sheet.clone()),
        (Table::Questions, config.questions_sheet.clone()),
        (Table::Responses, config.responses_sheet.clone()),
    ]);

    let client = GoogleSheetsClient::new(&config.sheets_api_base, auth, locations)?;
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
