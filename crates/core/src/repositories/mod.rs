//! Contact repositories.
//!
//! The endpoint never talks to storage directly: it is handed a [`ContactRepository`] at
//! startup and calls only the five operations below. Two implementations ship with the crate:
//!
//! - [`memory::InMemoryContactRepository`]: a process-local map, used by tests and
//!   `CONTACTS_STORE=memory`
//! - [`file::FileContactRepository`]: one JSON file per contact under the data directory
//!
//! Each implementation serialises its own mutations; callers add no locking of their own.

pub mod file;
pub mod memory;

use crate::contact::{Contact, ContactFields, ContactId};
use crate::ContactResult;

pub use file::FileContactRepository;
pub use memory::InMemoryContactRepository;

/// Persistence capability set for contacts.
pub trait ContactRepository: Send + Sync {
    /// Every stored contact, ordered by ascending identifier.
    fn list(&self) -> ContactResult<Vec<Contact>>;

    /// Fetch one contact.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ContactError::NotFound`] if `id` is not stored.
    fn get(&self, id: ContactId) -> ContactResult<Contact>;

    /// Store a new contact under a freshly allocated identifier.
    fn create(&self, fields: ContactFields) -> ContactResult<Contact>;

    /// Replace the stored values of an existing contact.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ContactError::NotFound`] if `id` is not stored.
    fn update(&self, id: ContactId, fields: ContactFields) -> ContactResult<Contact>;

    /// Remove a contact.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ContactError::NotFound`] if `id` is not stored, including when it has
    /// already been deleted.
    fn delete(&self, id: ContactId) -> ContactResult<()>;
}
