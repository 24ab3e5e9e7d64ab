use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, DEFAULT_REST_ADDR, config_from_env, serve};
use contacts_core::StoreKind;

/// Main entry point for the contacts service
///
/// Loads `.env`, resolves configuration once, opens the configured contact store and serves
/// the REST API.
///
/// Reads are open to everyone. Writes require the `x-api-key` header to match `API_KEY`.
///
/// # Environment Variables
/// - `CONTACTS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CONTACTS_DATA_DIR`: Directory for contact storage (default: "contacts_data")
/// - `CONTACTS_SCHEMA_FILE`: YAML schema describing contact fields (default: name + email)
/// - `CONTACTS_STORE`: `file` or `memory` (default: "file")
/// - `API_KEY`: API key required for writes
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("contacts_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("contacts_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CONTACTS_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = config_from_env()?;
    match cfg.store() {
        StoreKind::File => tracing::info!("++ Contact store: {}", cfg.data_dir().display()),
        StoreKind::Memory => tracing::info!("++ Contact store: in-memory"),
    }
    tracing::info!(
        "++ Contact schema fields: {}",
        cfg.schema()
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let state = AppState::from_config(&cfg)?;

    tracing::info!("++ Starting contacts REST on {}", rest_addr);
    serve(&rest_addr, state).await
}
