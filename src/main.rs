mod app;
mod auth;
mod config;
mod error;
mod state;
mod weather;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "farmlink=debug,axum=info,tower_http=info".to_string());
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

    let (app_state, db, reachable) = state::AppState::init().await?;

    // Best effort; a degraded start skips them until the next restart
    if reachable {
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    } else {
        tracing::warn!("skipping migrations while the database is unreachable");
    }

    let server = app_state.config.server.clone();
    app::serve(app::build_app(app_state), &server).await
}
