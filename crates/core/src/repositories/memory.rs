//! Process-local contact storage.

use super::ContactRepository;
use crate::contact::{Contact, ContactFields, ContactId};
use crate::{ContactError, ContactResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct MemoryState {
    next_id: Option<ContactId>,
    contacts: BTreeMap<ContactId, ContactFields>,
}

/// Contacts held in a map behind a mutex. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryContactRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: Some(ContactId::FIRST),
                contacts: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> ContactResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| ContactError::LockPoisoned)
    }
}

impl Default for InMemoryContactRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactRepository for InMemoryContactRepository {
    fn list(&self) -> ContactResult<Vec<Contact>> {
        let state = self.lock()?;
        Ok(state
            .contacts
            .iter()
            .map(|(id, fields)| Contact {
                id: *id,
                fields: fields.clone(),
            })
            .collect())
    }

    fn get(&self, id: ContactId) -> ContactResult<Contact> {
        let state = self.lock()?;
        state
            .contacts
            .get(&id)
            .map(|fields| Contact {
                id,
                fields: fields.clone(),
            })
            .ok_or(ContactError::NotFound(id))
    }

    fn create(&self, fields: ContactFields) -> ContactResult<Contact> {
        let mut state = self.lock()?;
        let id = state.next_id.ok_or(ContactError::IdExhausted)?;
        state.next_id = id.next();
        state.contacts.insert(id, fields.clone());
        Ok(Contact { id, fields })
    }

    fn update(&self, id: ContactId, fields: ContactFields) -> ContactResult<Contact> {
        let mut state = self.lock()?;
        let stored = state
            .contacts
            .get_mut(&id)
            .ok_or(ContactError::NotFound(id))?;
        *stored = fields.clone();
        Ok(Contact { id, fields })
    }

    fn delete(&self, id: ContactId) -> ContactResult<()> {
        let mut state = self.lock()?;
        state
            .contacts
            .remove(&id)
            .map(|_| ())
            .ok_or(ContactError::NotFound(id))
    }
}
