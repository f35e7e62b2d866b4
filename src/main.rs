// src/main.rs
use stowage_planner::api;
use stowage_planner::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let dotenv_result = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = dotenv_result {
        let missing_file = matches!(
            err,
            dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        );
        if !missing_file {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let planner_config = app_config.planner.clone();

    tracing::info!(
        "🚀 Stowage planner starting (grid {} m, layers: {}, default container: {})",
        planner_config.grid_pitch,
        planner_config.layering.strategy.as_str(),
        planner_config.default_container_id
    );
    api::start_api_server(api_config, planner_config).await
}
