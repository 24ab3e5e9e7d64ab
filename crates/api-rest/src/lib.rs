//! # API REST
//!
//! REST API implementation for the contacts service.
//!
//! Handles:
//! - HTTP endpoints with axum (`/contacts/`, `/contacts/{id}/`, `/health`)
//! - The read/write permission split as a route layer
//! - OpenAPI/Swagger documentation, with the contact component generated from the configured
//!   schema
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for wire types and the permission policy, and `contacts-core` for
//! validation and storage.

#![warn(rust_2018_idioms)]

pub mod contacts;
pub mod error;
pub mod permissions;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::schema::{ObjectBuilder, Schema, SchemaType};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::RefOr;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{ContactPageRes, ContactRes, ErrorRes, HealthRes, HealthService, API_KEY_HEADER};
use contacts_core::{
    config::{api_key_from_env_value, schema_from_env_value, store_kind_from_env_value},
    ContactRepository, ContactResult, ContactSchema, CoreConfig, FieldKind, NonEmptyText,
};

pub use error::ApiError;

/// Route of the contact collection.
pub const CONTACTS_ROUTE: &str = "/contacts/";
/// Route of a single contact.
pub const CONTACT_ITEM_ROUTE: &str = "/contacts/:id/";

/// Default listen address when `CONTACTS_REST_ADDR` is unset.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers. Everything here
/// is resolved at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    schema: Arc<ContactSchema>,
    repository: Arc<dyn ContactRepository>,
    api_key: Option<NonEmptyText>,
}

impl AppState {
    pub fn new(
        schema: Arc<ContactSchema>,
        repository: Arc<dyn ContactRepository>,
        api_key: Option<NonEmptyText>,
    ) -> Self {
        Self {
            schema,
            repository,
            api_key,
        }
    }

    /// Build state from startup configuration, opening the configured repository.
    pub fn from_config(cfg: &CoreConfig) -> ContactResult<Self> {
        Ok(Self::new(
            cfg.schema(),
            cfg.open_repository()?,
            cfg.api_key().cloned(),
        ))
    }

    pub fn schema(&self) -> &ContactSchema {
        &self.schema
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        contacts::list_contacts,
        contacts::retrieve_contact,
        contacts::create_contact,
        contacts::update_contact,
        contacts::partial_update_contact,
        contacts::destroy_contact,
    ),
    components(schemas(HealthRes, ErrorRes, ContactRes, ContactPageRes)),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

/// Describe a contact as the configured schema defines it.
fn contact_component(schema: &ContactSchema) -> RefOr<Schema> {
    let mut object = ObjectBuilder::new()
        .schema_type(SchemaType::Object)
        .description(Some("A contact: read-only `id` plus the configured fields"))
        .property(
            "id",
            ObjectBuilder::new()
                .schema_type(SchemaType::Integer)
                .read_only(Some(true)),
        )
        .required("id");

    for spec in schema.fields() {
        let schema_type = match spec.kind {
            FieldKind::Text | FieldKind::Email => SchemaType::String,
            FieldKind::Integer => SchemaType::Integer,
            FieldKind::Boolean => SchemaType::Boolean,
        };
        let mut property = ObjectBuilder::new()
            .schema_type(schema_type)
            .nullable(!spec.required)
            .max_length(spec.max_length);
        if spec.kind == FieldKind::Email {
            property = property.description(Some("Email address"));
        }
        object = object.property(spec.name.clone(), property);
        if spec.required {
            object = object.required(spec.name.clone());
        }
    }

    RefOr::T(Schema::Object(object.build()))
}

/// The OpenAPI document for this server, with the contact component taken from `schema`.
pub fn openapi(schema: &ContactSchema) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if let Some(components) = doc.components.as_mut() {
        components
            .schemas
            .insert("ContactRes".to_string(), contact_component(schema));
    }
    doc
}

/// Build the full router: contacts routes behind the permission layer, health, and docs.
pub fn router(state: AppState) -> Router {
    let contacts_routes = Router::new()
        .route(
            CONTACTS_ROUTE,
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            CONTACT_ITEM_ROUTE,
            get(contacts::retrieve_contact)
                .put(contacts::update_contact)
                .patch(contacts::partial_update_contact)
                .delete(contacts::destroy_contact),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            permissions::enforce_permissions,
        ));

    let doc = openapi(&state.schema);

    Router::new()
        .route("/health", get(health))
        .merge(contacts_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve startup configuration from the process environment.
///
/// # Environment Variables
/// - `CONTACTS_DATA_DIR`: Directory for the file store (default: "contacts_data")
/// - `CONTACTS_SCHEMA_FILE`: YAML schema file (default: built-in `name`/`email`)
/// - `CONTACTS_STORE`: `file` or `memory` (default: "file")
/// - `API_KEY`: Key required for writes (unset: writes refused)
///
/// # Errors
/// Returns an error if any value is present but invalid, or the schema file cannot be loaded.
pub fn config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = std::env::var("CONTACTS_DATA_DIR")
        .unwrap_or_else(|_| contacts_core::DEFAULT_CONTACTS_DATA_DIR.into());
    let schema = schema_from_env_value(std::env::var("CONTACTS_SCHEMA_FILE").ok())?;
    let store = store_kind_from_env_value(std::env::var("CONTACTS_STORE").ok())?;
    let api_key = api_key_from_env_value(std::env::var("API_KEY").ok())?;

    if api_key.is_none() {
        tracing::warn!("API_KEY is not set; all write requests will be refused");
    }

    Ok(CoreConfig::new(
        PathBuf::from(data_dir),
        schema,
        api_key,
        store,
    )?)
}

/// Bind `addr` and serve the router until the process stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the contacts REST API. Never requires credentials.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
