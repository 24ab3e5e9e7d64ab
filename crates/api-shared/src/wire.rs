//! Request and response bodies shared by the API surfaces.

use serde::{Deserialize, Serialize};
use utoipa::openapi::schema::{AdditionalProperties, ObjectBuilder, Schema, SchemaType};
use utoipa::openapi::RefOr;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body for every non-validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub detail: String,
}

impl ErrorRes {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// A serialized contact: `id` plus the configured schema fields.
///
/// The field set is only known at runtime, so the body is carried as a JSON object and the
/// OpenAPI schema below describes just the fixed part. Servers replace this component with one
/// generated from their configured schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactRes(pub serde_json::Value);

impl<'s> ToSchema<'s> for ContactRes {
    fn schema() -> (&'s str, RefOr<Schema>) {
        let object = ObjectBuilder::new()
            .schema_type(SchemaType::Object)
            .description(Some("A contact: read-only `id` plus configured fields"))
            .property(
                "id",
                ObjectBuilder::new()
                    .schema_type(SchemaType::Integer)
                    .read_only(Some(true)),
            )
            .required("id")
            .additional_properties(Some(AdditionalProperties::FreeForm(true)))
            .build();
        ("ContactRes", RefOr::T(Schema::Object(object)))
    }
}

/// One window of the contact list, returned when `limit` or `offset` is supplied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactPageRes {
    /// Total number of contacts, ignoring the window.
    pub count: usize,
    pub results: Vec<ContactRes>,
}
