//! The persisted Contact record.
//!
//! A [`Contact`] is an identifier plus a bag of typed attribute values. Which attributes exist,
//! and what they may contain, is decided by the configured [`ContactSchema`]; this module only
//! carries values that have already passed validation.

use crate::constants::ID_FIELD_NAME;
use crate::schema::ContactSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a stored contact.
///
/// Identifiers are positive integers allocated by the repository at creation time and never
/// reused within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(u64);

impl ContactId {
    /// The first identifier handed out by an empty store.
    pub const FIRST: ContactId = ContactId(1);

    /// Wraps a raw identifier. Zero is not a valid identifier.
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Parses an identifier taken from a URL path segment or CLI argument.
    ///
    /// Returns `None` for anything that is not a positive decimal integer, which callers treat
    /// as "does not address any contact".
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        input.parse::<u64>().ok().and_then(Self::new)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The identifier that follows this one, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated attribute value.
///
/// Email addresses are stored as [`FieldValue::Text`]; the schema decides how a value is
/// checked, not the stored variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Attribute values of a contact, keyed by schema field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactFields(BTreeMap<String, FieldValue>);

impl ContactFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    /// Overwrites every value present in `changes`, leaving all other values untouched.
    pub fn merge(&mut self, changes: ContactFields) {
        self.0.extend(changes.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stored contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub fields: ContactFields,
}

impl Contact {
    /// Renders the wire representation: `id` followed by every schema field in schema order.
    ///
    /// Fields the schema declares but the contact has never been given render as `null`;
    /// stored values for fields the schema no longer declares are omitted.
    pub fn to_wire(&self, schema: &ContactSchema) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(schema.fields().len() + 1);
        map.insert(ID_FIELD_NAME.to_owned(), serde_json::Value::from(self.id.get()));
        for spec in schema.fields() {
            let value = self
                .fields
                .get(&spec.name)
                .map(FieldValue::to_json)
                .unwrap_or(serde_json::Value::Null);
            map.insert(spec.name.clone(), value);
        }
        serde_json::Value::Object(map)
    }
}
