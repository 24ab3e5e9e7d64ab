//! # Contacts Core
//!
//! Core data logic for the contacts service.
//!
//! This crate contains pure data operations:
//! - The contact record and its identifier ([`contact`])
//! - The configurable field set and payload validation ([`schema`])
//! - Storage behind the [`ContactRepository`] trait ([`repositories`])
//! - Startup configuration ([`config`])
//!
//! **No API concerns**: authentication, permissions, and HTTP handling belong in `api-shared`
//! and `api-rest`.

pub mod config;
pub mod constants;
pub mod contact;
pub mod error;
pub mod repositories;
pub mod schema;

pub use config::{CoreConfig, StoreKind};
pub use constants::DEFAULT_CONTACTS_DATA_DIR;
pub use contact::{Contact, ContactFields, ContactId, FieldValue};
pub use error::{ContactError, ContactResult};
pub use repositories::ContactRepository;
pub use schema::{ContactSchema, FieldKind, FieldSpec, ValidationErrors, ValidationMode};

pub use contacts_types::{EmailAddress, NonEmptyText, TextError};
