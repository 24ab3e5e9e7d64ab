//! Per-request permission check for the contacts routes.

use crate::error::ApiError;
use crate::{AppState, CONTACT_ITEM_ROUTE};
use api_shared::{authorise, Operation, Target, API_KEY_HEADER};
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

/// Route layer that classifies the request and applies the read/write policy.
///
/// Runs after routing (so the matched route tells collection from item) and before any
/// extractor in the handler, so a refused write never has its body parsed.
pub async fn enforce_permissions(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let target = match request.extensions().get::<MatchedPath>().map(MatchedPath::as_str) {
        Some(CONTACT_ITEM_ROUTE) => Target::Item,
        _ => Target::Collection,
    };

    let Some(operation) = Operation::classify(request.method().as_str(), target) else {
        return Ok(next.run(request).await);
    };

    // A header that is present but not valid UTF-8 counts as a wrong key, not a missing one.
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.to_str().unwrap_or_default());

    if let Err(err) = authorise(operation, provided, state.api_key.as_ref()) {
        tracing::warn!(
            "refused {} {}: {}",
            operation.name(),
            request.uri().path(),
            err
        );
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
