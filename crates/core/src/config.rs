//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the endpoint and repositories. Binaries read the environment and hand the raw
//! values to the `*_from_env_value` helpers here, so nothing reads process-wide environment
//! variables during request handling.

use crate::repositories::{ContactRepository, FileContactRepository, InMemoryContactRepository};
use crate::schema::ContactSchema;
use crate::{ContactError, ContactResult};
use contacts_types::NonEmptyText;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Which repository implementation backs the endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// One JSON file per contact under the data directory.
    #[default]
    File,
    /// Process-local map; contents are lost on restart.
    Memory,
}

impl FromStr for StoreKind {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(ContactError::InvalidInput(format!(
                "unknown contact store '{other}' (expected 'file' or 'memory')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    schema: Arc<ContactSchema>,
    api_key: Option<NonEmptyText>,
    store: StoreKind,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::InvalidInput`] if a file store is requested with an empty data
    /// directory path.
    pub fn new(
        data_dir: PathBuf,
        schema: ContactSchema,
        api_key: Option<NonEmptyText>,
        store: StoreKind,
    ) -> ContactResult<Self> {
        if store == StoreKind::File && data_dir.as_os_str().is_empty() {
            return Err(ContactError::InvalidInput(
                "data directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            schema: Arc::new(schema),
            api_key,
            store,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn schema(&self) -> Arc<ContactSchema> {
        Arc::clone(&self.schema)
    }

    /// The key writers must present. `None` means no caller can write.
    pub fn api_key(&self) -> Option<&NonEmptyText> {
        self.api_key.as_ref()
    }

    pub fn store(&self) -> StoreKind {
        self.store
    }

    /// Build the configured repository.
    pub fn open_repository(&self) -> ContactResult<Arc<dyn ContactRepository>> {
        let repository: Arc<dyn ContactRepository> = match self.store {
            StoreKind::File => Arc::new(FileContactRepository::open(&self.data_dir)?),
            StoreKind::Memory => Arc::new(InMemoryContactRepository::new()),
        };
        Ok(repository)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the store kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreKind::File`].
pub fn store_kind_from_env_value(value: Option<String>) -> ContactResult<StoreKind> {
    non_blank(value)
        .map(|v| v.parse::<StoreKind>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse the write API key from an optional string value.
///
/// An unset variable yields `None`, and then every write is refused. A variable that is set
/// but blank is an error.
pub fn api_key_from_env_value(value: Option<String>) -> ContactResult<Option<NonEmptyText>> {
    match value {
        None => Ok(None),
        Some(raw) => NonEmptyText::new(raw).map(Some).map_err(|_| {
            ContactError::InvalidInput("API_KEY is set but empty".into())
        }),
    }
}

/// Load the contact schema from an optional file path.
///
/// If `value` is `None` or empty/whitespace, returns [`ContactSchema::builtin`].
pub fn schema_from_env_value(value: Option<String>) -> ContactResult<ContactSchema> {
    match non_blank(value) {
        Some(path) => ContactSchema::load(Path::new(&path)),
        None => Ok(ContactSchema::builtin()),
    }
}
