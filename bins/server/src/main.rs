//! Recibo API Server
//!
//! Main entry point for the Recibo backend service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recibo_api::{AppState, create_router};
use recibo_core::anthropic::AnthropicClient;
use recibo_core::processor::ReceiptProcessor;
use recibo_core::storage::{StorageConfig, StorageProvider, StorageService};
use recibo_db::connect;
use recibo_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recibo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    #[allow(clippy::cast_possible_wrap)]
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });

    // Create storage service (local filesystem)
    let storage_config = StorageConfig::new(StorageProvider::local_fs(&config.storage.root))
        .with_max_file_size(config.storage.max_upload_bytes)
        .with_public_base_url(config.storage.public_base_url.clone());
    let storage = StorageService::from_config(storage_config)?;
    info!(provider = storage.provider_name(), "Storage configured");

    // Create the model client shared by extraction and classification
    let model = AnthropicClient::new(
        config.anthropic.base_url.clone(),
        config.anthropic.api_key.clone(),
        config.anthropic.model.clone(),
        Duration::from_secs(config.anthropic.request_timeout_secs),
    )?;
    info!(model = %config.anthropic.model, "Model client configured");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
        processor: Arc::new(ReceiptProcessor::new(model)),
        confidence_threshold: config.categorization.confidence_threshold,
    };

    // Create router; serve locally stored receipt images in development
    let app = create_router(state)
        .nest_service("/uploads", ServeDir::new(&config.storage.root));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
