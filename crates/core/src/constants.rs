//! Constants used throughout the contacts core crate.
//!
//! This module contains path, filename and schema constants so the storage layout and the
//! built-in field set are defined in one place.

/// Default directory for contact data storage when no explicit directory is configured.
pub const DEFAULT_CONTACTS_DATA_DIR: &str = "contacts_data";

/// Directory name (under the data directory) holding one file per contact.
pub const CONTACTS_DIR_NAME: &str = "contacts";

/// Extension of stored contact files.
pub const CONTACT_FILE_EXTENSION: &str = "json";

/// File (inside the contacts directory) recording the highest identifier ever issued.
pub const LAST_ISSUED_ID_FILE_NAME: &str = ".last_id";

/// Name of the read-only identifier attribute in the wire representation.
pub const ID_FIELD_NAME: &str = "id";

/// Key used for validation errors that are not tied to a single field.
pub const NON_FIELD_ERRORS_KEY: &str = "non_field_errors";

/// Maximum length of a field name in a contact schema.
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// Name of the built-in text field.
pub const DEFAULT_NAME_FIELD: &str = "name";

/// Name of the built-in email field.
pub const DEFAULT_EMAIL_FIELD: &str = "email";

/// Maximum length of the built-in name field.
pub const DEFAULT_NAME_MAX_LEN: usize = 255;
