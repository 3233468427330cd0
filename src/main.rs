use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use chrono::Duration;
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use storefront_api::auth::{Argon2Hasher, SecretHasher, TokenCodec};
use storefront_api::config::AppConfig;
use storefront_api::database::{DatabaseManager, MemoryAddresses, MemoryUsers, PgAddresses, PgUsers};
use storefront_api::{app, AppState};

#[derive(Parser)]
#[command(name = "storefront-api")]
#[command(about = "Storefront REST API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Bind address (overrides API_HOST)")]
    host: Option<String>,

    #[arg(long, short, help = "Listen port (overrides API_PORT / PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!("Starting Storefront API in {:?} mode", config.environment);
    if config.uses_development_secret() {
        tracing::warn!("Using the built-in development JWT secret; set JWT_SECRET outside local development");
    }

    let tokens = TokenCodec::new(config.security.jwt_secret.as_bytes())
        .context("failed to initialise token codec")?;
    let token_ttl = Duration::seconds(config.security.token_ttl_secs);
    let hasher: Arc<dyn SecretHasher> = Arc::new(Argon2Hasher::default());

    let database = if config.database.url.is_some() {
        let database = DatabaseManager::connect(&config.database).await?;
        database.migrate().await?;
        Some(database)
    } else {
        None
    };

    let state = match &database {
        Some(database) => AppState::new(
            tokens,
            token_ttl,
            hasher,
            Arc::new(PgUsers::new(database.pool().clone())),
            Arc::new(PgAddresses::new(database.pool().clone())),
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage (data is lost on exit)");
            AppState::new(
                tokens,
                token_ttl,
                hasher,
                Arc::new(MemoryUsers::new()),
                Arc::new(MemoryAddresses::new()),
            )
        }
    };

    let mut router = app(state.with_request_logging(config.api.enable_request_logging));
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Storefront API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
