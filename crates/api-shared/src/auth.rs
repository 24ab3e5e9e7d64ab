//! Permission policy for the contacts endpoint.
//!
//! Every request is classified into an [`Operation`]. Each operation requires one
//! [`Capability`]: reads are open to anonymous callers, writes need a caller that presents the
//! configured API key in the `x-api-key` header. The check runs before any payload is parsed
//! or any repository call is made.

use contacts_types::NonEmptyText;
use subtle::ConstantTimeEq;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// What a caller must hold to perform an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Anyone, authenticated or not.
    Read,
    /// Authenticated callers only.
    Write,
}

/// Whether a request addresses the collection or a single item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Collection,
    Item,
}

/// The six operations of the contacts endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Operation {
    /// Map an HTTP method and target to an operation.
    ///
    /// Returns `None` for combinations the endpoint does not serve; the router answers those
    /// with `405 Method Not Allowed` without consulting the policy.
    pub fn classify(method: &str, target: Target) -> Option<Self> {
        match (method, target) {
            ("GET" | "HEAD", Target::Collection) => Some(Operation::List),
            ("GET" | "HEAD", Target::Item) => Some(Operation::Retrieve),
            ("POST", Target::Collection) => Some(Operation::Create),
            ("PUT", Target::Item) => Some(Operation::Update),
            ("PATCH", Target::Item) => Some(Operation::PartialUpdate),
            ("DELETE", Target::Item) => Some(Operation::Destroy),
            _ => None,
        }
    }

    pub fn required_capability(self) -> Capability {
        match self {
            Operation::List | Operation::Retrieve => Capability::Read,
            Operation::Create
            | Operation::Update
            | Operation::PartialUpdate
            | Operation::Destroy => Capability::Write,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Retrieve => "retrieve",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::PartialUpdate => "partial_update",
            Operation::Destroy => "destroy",
        }
    }
}

/// Why a caller was refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was sent. Maps to `401 Unauthorized`.
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    /// A credential was sent but does not match. Maps to `403 Forbidden`.
    #[error("Invalid API key.")]
    InvalidCredentials,
    /// The server has no API key configured, so nobody may write. Maps to `403 Forbidden`.
    #[error("Write access is disabled on this server.")]
    WritesDisabled,
}

/// Decide whether a caller holding `provided` may perform `operation`.
///
/// Read operations never look at the credential.
pub fn authorise(
    operation: Operation,
    provided: Option<&str>,
    expected: Option<&NonEmptyText>,
) -> Result<(), AuthError> {
    match operation.required_capability() {
        Capability::Read => Ok(()),
        Capability::Write => {
            let provided = provided.ok_or(AuthError::MissingCredentials)?;
            let expected = expected.ok_or(AuthError::WritesDisabled)?;
            validate_api_key(provided, expected)
        }
    }
}

/// Validates the provided API key against the configured key.
///
/// Returns `Ok(())` if the key is valid, or an error if it does not match.
pub fn validate_api_key(provided_key: &str, expected_key: &NonEmptyText) -> Result<(), AuthError> {
    if provided_key
        .as_bytes()
        .ct_eq(expected_key.as_str().as_bytes())
        .into()
    {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
