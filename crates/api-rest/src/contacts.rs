//! Handlers for the `/contacts/` resource.
//!
//! Permissions are enforced by [`crate::permissions::enforce_permissions`] before any handler
//! here runs, so handlers deal only with parsing, validation and repository calls.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{ContactPageRes, ContactRes, ErrorRes};
use axum::{
    body::Bytes,
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use contacts_core::{Contact, ContactId, ValidationErrors, ValidationMode};
use serde::Deserialize;
use serde_json::Value;

const INVALID_INTEGER: &str = "A valid integer is required.";
const POSITIVE_INTEGER: &str = "Ensure this value is greater than or equal to 1.";

/// Optional list window. Kept as raw strings so bad values become field-level errors.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListParams {
    /// Resolve the window, or `None` when the caller asked for the whole list.
    fn window(&self) -> Result<Option<(Option<usize>, usize)>, ApiError> {
        if self.limit.is_none() && self.offset.is_none() {
            return Ok(None);
        }

        let mut errors = ValidationErrors::default();
        let limit = match self.limit.as_deref().map(str::trim) {
            None => None,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => {
                    errors.add("limit", POSITIVE_INTEGER);
                    None
                }
                Ok(n) => Some(n),
                Err(_) => {
                    errors.add("limit", INVALID_INTEGER);
                    None
                }
            },
        };
        let offset = match self.offset.as_deref().map(str::trim) {
            None => 0,
            Some(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
                errors.add("offset", INVALID_INTEGER);
                0
            }),
        };

        if errors.is_empty() {
            Ok(Some((limit, offset)))
        } else {
            Err(ApiError::InvalidQuery(errors))
        }
    }
}

fn parse_id(raw: &str) -> Result<ContactId, ApiError> {
    ContactId::parse(raw).ok_or(ApiError::NotFound)
}

/// Parse a request body. An empty body is treated as an empty object.
fn parse_payload(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}

fn render(state: &AppState, contact: &Contact) -> ContactRes {
    ContactRes(contact.to_wire(&state.schema))
}

#[utoipa::path(
    get,
    path = "/contacts/",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of contacts to return"),
        ("offset" = Option<usize>, Query, description = "Number of contacts to skip")
    ),
    responses(
        (status = 200, description = "All contacts ordered by id, or one window of them when limit/offset is given", body = [ContactRes]),
        (status = 400, description = "Invalid limit or offset"),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List contacts.
///
/// Without `limit`/`offset` the body is a plain array. With either one the body is a
/// [`ContactPageRes`] holding the total count and the requested window.
#[axum::debug_handler]
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let window = params.window()?;
    let contacts = state.repository.list()?;

    let Some((limit, offset)) = window else {
        let body: Vec<ContactRes> = contacts.iter().map(|c| render(&state, c)).collect();
        return Ok(Json(body).into_response());
    };

    let count = contacts.len();
    let results = contacts
        .iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .map(|c| render(&state, c))
        .collect();
    Ok(Json(ContactPageRes { count, results }).into_response())
}

#[utoipa::path(
    get,
    path = "/contacts/{id}/",
    params(("id" = u64, Path, description = "Contact identifier")),
    responses(
        (status = 200, description = "The contact", body = ContactRes),
        (status = 404, description = "No contact with this id", body = ErrorRes)
    )
)]
/// Retrieve one contact.
#[axum::debug_handler]
pub async fn retrieve_contact(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ContactRes>, ApiError> {
    let id = parse_id(&id)?;
    let contact = state.repository.get(id)?;
    Ok(Json(render(&state, &contact)))
}

#[utoipa::path(
    post,
    path = "/contacts/",
    request_body = ContactRes,
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Contact created", body = ContactRes),
        (status = 400, description = "Payload failed validation"),
        (status = 401, description = "No credentials supplied", body = ErrorRes),
        (status = 403, description = "Credentials rejected", body = ErrorRes)
    )
)]
/// Create a contact.
///
/// The payload must supply every required schema field. Any `id` in the payload is ignored;
/// the repository assigns one.
#[axum::debug_handler]
pub async fn create_contact(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ContactRes>), ApiError> {
    let payload = parse_payload(&body)?;
    let fields = state.schema.validate(&payload, ValidationMode::Full)?;
    let contact = state.repository.create(fields)?;

    tracing::info!("created contact {}", contact.id);
    Ok((StatusCode::CREATED, Json(render(&state, &contact))))
}

/// Shared body of full and partial update.
///
/// The stored contact is fetched first so that an unknown id is a 404 even when the payload
/// is also invalid.
fn apply_update(
    state: &AppState,
    raw_id: &str,
    body: &Bytes,
    mode: ValidationMode,
) -> Result<Contact, ApiError> {
    let id = parse_id(raw_id)?;
    let existing = state.repository.get(id)?;
    let payload = parse_payload(body)?;
    let changes = state.schema.validate(&payload, mode)?;

    let mut fields = existing.fields;
    fields.merge(changes);
    let updated = state.repository.update(id, fields)?;

    tracing::info!("updated contact {} ({:?})", id, mode);
    Ok(updated)
}

#[utoipa::path(
    put,
    path = "/contacts/{id}/",
    params(("id" = u64, Path, description = "Contact identifier")),
    request_body = ContactRes,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Contact updated", body = ContactRes),
        (status = 400, description = "Payload failed validation"),
        (status = 401, description = "No credentials supplied", body = ErrorRes),
        (status = 403, description = "Credentials rejected", body = ErrorRes),
        (status = 404, description = "No contact with this id", body = ErrorRes)
    )
)]
/// Update a contact. Every required schema field must be supplied.
#[axum::debug_handler]
pub async fn update_contact(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Bytes,
) -> Result<Json<ContactRes>, ApiError> {
    let contact = apply_update(&state, &id, &body, ValidationMode::Full)?;
    Ok(Json(render(&state, &contact)))
}

#[utoipa::path(
    patch,
    path = "/contacts/{id}/",
    params(("id" = u64, Path, description = "Contact identifier")),
    request_body = ContactRes,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Contact updated", body = ContactRes),
        (status = 400, description = "Payload failed validation"),
        (status = 401, description = "No credentials supplied", body = ErrorRes),
        (status = 403, description = "Credentials rejected", body = ErrorRes),
        (status = 404, description = "No contact with this id", body = ErrorRes)
    )
)]
/// Partially update a contact. Only the supplied fields change.
#[axum::debug_handler]
pub async fn partial_update_contact(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Bytes,
) -> Result<Json<ContactRes>, ApiError> {
    let contact = apply_update(&state, &id, &body, ValidationMode::Partial)?;
    Ok(Json(render(&state, &contact)))
}

#[utoipa::path(
    delete,
    path = "/contacts/{id}/",
    params(("id" = u64, Path, description = "Contact identifier")),
    security(("api_key" = [])),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 401, description = "No credentials supplied", body = ErrorRes),
        (status = 403, description = "Credentials rejected", body = ErrorRes),
        (status = 404, description = "No contact with this id", body = ErrorRes)
    )
)]
/// Delete a contact. Deleting an already-deleted id is a 404.
#[axum::debug_handler]
pub async fn destroy_contact(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.repository.delete(id)?;

    tracing::info!("deleted contact {}", id);
    Ok(StatusCode::NO_CONTENT)
}
