//! Contact schema and payload validation.
//!
//! The field set of a contact is configuration, not code. A [`ContactSchema`] is loaded once at
//! startup (from YAML, or the built-in `name`/`email` default) and every inbound payload goes
//! through [`ContactSchema::validate`] before it reaches a repository.
//!
//! ## Schema file
//!
//! ```yaml
//! fields:
//!   - name: name
//!     kind: text          # text | email | integer | boolean
//!     required: true      # default: true
//!     max_length: 255     # text and email only
//!   - name: email
//!     kind: email
//! ```
//!
//! ## Validation
//!
//! Validation maps a JSON payload to [`ContactFields`] holding only the values the caller
//! supplied. Unknown keys and the read-only `id` are ignored. In [`ValidationMode::Full`] every
//! required field must be present; in [`ValidationMode::Partial`] absent fields are skipped so
//! that a merge leaves them unchanged. All problems are collected into one
//! [`ValidationErrors`] keyed by field name.

use crate::constants::{
    DEFAULT_EMAIL_FIELD, DEFAULT_NAME_FIELD, DEFAULT_NAME_MAX_LEN, ID_FIELD_NAME,
    MAX_FIELD_NAME_LEN, NON_FIELD_ERRORS_KEY,
};
use crate::contact::{ContactFields, FieldValue};
use crate::{ContactError, ContactResult};
use contacts_types::{EmailAddress, TextError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const REQUIRED: &str = "This field is required.";
const MAY_NOT_BE_NULL: &str = "This field may not be null.";
const MAY_NOT_BE_BLANK: &str = "This field may not be blank.";
const NOT_A_VALID_STRING: &str = "Not a valid string.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_BOOLEAN: &str = "Must be a valid boolean.";

/// The value type of a schema field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Integer,
    Boolean,
}

impl FieldKind {
    fn supports_max_length(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Email)
    }
}

fn default_required() -> bool {
    true
}

/// One attribute of a contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaWire {
    fields: Vec<FieldSpec>,
}

/// Whether absent fields count against required-ness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    /// Create and full update: every required field must be supplied.
    Full,
    /// Partial update: only supplied fields are checked.
    Partial,
}

/// Field-level validation failures, keyed by field name.
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("payload failed validation for {} field(s)", .0.len())]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// A single error that is not attached to any one field.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(NON_FIELD_ERRORS_KEY, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// The configured field set of a contact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactSchema {
    fields: Vec<FieldSpec>,
}

impl ContactSchema {
    /// Builds a schema from field specs, rejecting unusable definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::InvalidSchema`] if:
    /// - there are no fields,
    /// - a field name is empty, too long, uses characters outside `[a-z0-9_]`, or is `id`,
    /// - a field name is declared twice,
    /// - `max_length` is zero or set on a non-text field.
    pub fn new(fields: Vec<FieldSpec>) -> ContactResult<Self> {
        if fields.is_empty() {
            return Err(ContactError::InvalidSchema(
                "schema must declare at least one field".into(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &fields {
            validate_field_name(&spec.name)?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ContactError::InvalidSchema(format!(
                    "field '{}' is declared more than once",
                    spec.name
                )));
            }
            match spec.max_length {
                Some(0) => {
                    return Err(ContactError::InvalidSchema(format!(
                        "field '{}' has max_length 0",
                        spec.name
                    )))
                }
                Some(_) if !spec.kind.supports_max_length() => {
                    return Err(ContactError::InvalidSchema(format!(
                        "field '{}' sets max_length but is not a text field",
                        spec.name
                    )))
                }
                _ => {}
            }
        }

        Ok(Self { fields })
    }

    /// The schema used when no schema file is configured: a required `name` and `email`.
    pub fn builtin() -> Self {
        Self {
            fields: vec![
                FieldSpec {
                    name: DEFAULT_NAME_FIELD.into(),
                    kind: FieldKind::Text,
                    required: true,
                    max_length: Some(DEFAULT_NAME_MAX_LEN),
                },
                FieldSpec {
                    name: DEFAULT_EMAIL_FIELD.into(),
                    kind: FieldKind::Email,
                    required: true,
                    max_length: Some(EmailAddress::MAX_LEN),
                },
            ],
        }
    }

    /// Parse a schema from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `fields[1].kind`)
    /// to the failing entry when the YAML does not match the schema format.
    pub fn parse(yaml_text: &str) -> ContactResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, SchemaWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(ContactError::InvalidSchema(format!(
                    "schema mismatch at {path}: {source}"
                )));
            }
        };

        Self::new(wire.fields)
    }

    /// Read and parse a schema file.
    pub fn load(path: &Path) -> ContactResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ContactError::SchemaRead)?;
        Self::parse(&text)
    }

    /// Render the schema back to YAML in the format accepted by [`ContactSchema::parse`].
    pub fn render(&self) -> ContactResult<String> {
        serde_yaml::to_string(&SchemaWire {
            fields: self.fields.clone(),
        })
        .map_err(ContactError::YamlSerialization)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate a JSON payload and map it to typed field values.
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found, or a single `non_field_errors` entry when the
    /// payload is not a JSON object.
    pub fn validate(
        &self,
        payload: &Value,
        mode: ValidationMode,
    ) -> Result<ContactFields, ValidationErrors> {
        let Value::Object(map) = payload else {
            return Err(ValidationErrors::non_field(format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(payload)
            )));
        };

        let mut fields = ContactFields::new();
        let mut errors = ValidationErrors::default();

        for spec in &self.fields {
            match map.get(&spec.name) {
                None => {
                    if mode == ValidationMode::Full && spec.required {
                        errors.add(&spec.name, REQUIRED);
                    }
                }
                Some(raw) => match clean_value(spec, raw) {
                    Ok(value) => fields.insert(spec.name.clone(), value),
                    Err(message) => errors.add(&spec.name, message),
                },
            }
        }

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }
}

impl Default for ContactSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_field_name(name: &str) -> ContactResult<()> {
    if name.is_empty() {
        return Err(ContactError::InvalidSchema(
            "field name cannot be empty".into(),
        ));
    }
    if name.len() > MAX_FIELD_NAME_LEN {
        return Err(ContactError::InvalidSchema(format!(
            "field name '{name}' exceeds maximum length of {MAX_FIELD_NAME_LEN} characters"
        )));
    }
    let ok = name
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'_'));
    if !ok {
        return Err(ContactError::InvalidSchema(format!(
            "field name '{name}' contains invalid characters (only lowercase alphanumeric and '_' allowed)"
        )));
    }
    if name == ID_FIELD_NAME || name == NON_FIELD_ERRORS_KEY {
        return Err(ContactError::InvalidSchema(format!(
            "field name '{name}' is reserved"
        )));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Check one supplied value against its field spec.
///
/// Blank text in an optional field clears the value.
fn clean_value(spec: &FieldSpec, raw: &Value) -> Result<FieldValue, String> {
    if raw.is_null() {
        return if spec.required {
            Err(MAY_NOT_BE_NULL.into())
        } else {
            Ok(FieldValue::Null)
        };
    }

    match spec.kind {
        FieldKind::Text => {
            let text = match raw {
                Value::String(s) => s.trim().to_owned(),
                Value::Number(n) => n.to_string(),
                _ => return Err(NOT_A_VALID_STRING.into()),
            };
            if text.is_empty() {
                return blank(spec);
            }
            if let Some(max) = spec.max_length {
                if text.chars().count() > max {
                    return Err(max_length_message(max));
                }
            }
            Ok(FieldValue::Text(text))
        }
        FieldKind::Email => {
            let Value::String(s) = raw else {
                return Err(INVALID_EMAIL.into());
            };
            if s.trim().is_empty() {
                return blank(spec);
            }
            let email = EmailAddress::parse(s).map_err(|e| match e {
                TextError::TooLong { max } => max_length_message(max),
                _ => INVALID_EMAIL.to_owned(),
            })?;
            if let Some(max) = spec.max_length {
                if email.as_str().chars().count() > max {
                    return Err(max_length_message(max));
                }
            }
            Ok(FieldValue::Text(email.as_str().to_owned()))
        }
        FieldKind::Integer => match raw {
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Integer)
                .ok_or_else(|| INVALID_INTEGER.to_owned()),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| INVALID_INTEGER.to_owned()),
            _ => Err(INVALID_INTEGER.into()),
        },
        FieldKind::Boolean => {
            let parsed = match raw {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Some(true),
                    Some(0) => Some(false),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => Some(true),
                    "false" | "no" | "off" | "0" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            parsed
                .map(FieldValue::Boolean)
                .ok_or_else(|| INVALID_BOOLEAN.to_owned())
        }
    }
}

fn blank(spec: &FieldSpec) -> Result<FieldValue, String> {
    if spec.required {
        Err(MAY_NOT_BE_BLANK.into())
    } else {
        Ok(FieldValue::Null)
    }
}
