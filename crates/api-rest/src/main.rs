//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the contacts REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `contacts-run` binary also loads
//! a `.env` file before starting the same server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{config_from_env, serve, AppState, DEFAULT_REST_ADDR};

/// Main entry point for the contacts REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `CONTACTS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - see [`api_rest::config_from_env`] for storage, schema and API key settings
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the store cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CONTACTS_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!("-- Starting contacts REST API on {}", addr);

    let cfg = config_from_env()?;
    let state = AppState::from_config(&cfg)?;

    serve(&addr, state).await
}
