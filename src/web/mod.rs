//! HTTP surface

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::CheckgenError;
use crate::gemini::GeminiClient;
use crate::generator::InstructionGenerator;
use crate::scratch::ScratchDir;
use crate::storage::StrategyStore;

mod instructions;
mod prelude;

use instructions::{generate_instructions_handler, improve_instructions_handler};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    generator: InstructionGenerator,
    strategy: StrategyStore,
    scratch: ScratchDir,
}

impl AppState {
    fn new(generator: InstructionGenerator, strategy: StrategyStore, scratch: ScratchDir) -> Self {
        Self {
            generator,
            strategy,
            scratch,
        }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/generate_instructions",
            axum::routing::post(generate_instructions_handler),
        )
        .route(
            "/improve_instructions",
            axum::routing::post(improve_instructions_handler),
        )
}

fn cors_layer(origin: &str) -> Result<CorsLayer, CheckgenError> {
    let origin = HeaderValue::from_str(origin).map_err(|err| {
        CheckgenError::InvalidInput(format!("Invalid CORS origin {origin:?}: {err}"))
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}

/// Builds the full application, creating the scratch directory on the way.
pub async fn build_app(config: &ServerConfig) -> Result<Router, CheckgenError> {
    let scratch = ScratchDir::new(&config.scratch_dir);
    scratch.ensure().await?;

    let model = Arc::new(GeminiClient::new(config.model.clone()));
    let state = AppState::new(
        InstructionGenerator::new(model),
        StrategyStore::new(&config.strategy_path),
        scratch,
    );

    Ok(create_router()
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origin)?)
        .with_state(state))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Runs the server until ctrl-c.
pub async fn setup_server(config: ServerConfig) -> Result<(), anyhow::Error> {
    let app = build_app(&config).await?;

    let addr = format!("{}:{}", config.listen_address, config.port);
    info!("Starting server on http://{}", addr);
    info!(
        "Scratch dir {}, strategy file {}",
        config.scratch_dir.display(),
        config.strategy_path.display()
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
