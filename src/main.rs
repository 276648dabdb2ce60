use secured_calculator_mcp::{build_app, config::Config, logging, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    if config.api_key_is_default {
        warn!("MCP_API_KEY is not set; falling back to the built-in default key");
    }

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.api_key.clone());
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
