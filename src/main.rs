mod app;
mod auth;
mod config;
mod error;
mod memory;
mod resources;
mod response;
mod state;
mod users;
mod validation;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portfolio=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);
    let admin = config.admin.clone();
    tracing::info!(environment = ?config.environment, "starting portfolio api");

    let app_state = AppState::init(config).await?;

    if let Some(db) = app_state.pool() {
        sqlx::migrate!("./migrations").run(db).await?;
        tracing::info!("migrations applied");
    }

    if let Some(seed) = &admin {
        users::services::ensure_admin(&app_state, seed).await?;
    }

    let result = app::serve(app::build_app(app_state.clone()), &host, port).await;
    app_state.close().await;
    result
}
