//! # API Shared
//!
//! Shared utilities and definitions for the contacts APIs.
//!
//! Contains:
//! - Wire types with OpenAPI schemas (`wire` module)
//! - Shared services like `HealthService`
//! - The permission policy and API-key checks (`auth` module)
//!
//! Used by `api-rest`; nothing here depends on an HTTP framework.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{authorise, AuthError, Capability, Operation, Target, API_KEY_HEADER};
pub use health::HealthService;
pub use wire::*;
