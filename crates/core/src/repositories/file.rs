//! File-backed contact storage.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   contacts/
//!     .last_id
//!     1.json
//!     2.json
//! ```
//!
//! Each file holds one serialised [`Contact`]. Writes go to a temporary sibling first and are
//! renamed into place, so readers never observe a half-written contact.
//!
//! `.last_id` holds the highest identifier ever issued. It is written before the contact file
//! it covers, so identifiers of deleted contacts stay retired across restarts. On open, the
//! next identifier follows the larger of that marker and the highest file name present.

use super::ContactRepository;
use crate::constants::{CONTACTS_DIR_NAME, CONTACT_FILE_EXTENSION, LAST_ISSUED_ID_FILE_NAME};
use crate::contact::{Contact, ContactFields, ContactId};
use crate::{ContactError, ContactResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Attempts made to find a free file name before giving up on a create.
const MAX_CREATE_ATTEMPTS: usize = 5;

/// Contacts stored as one JSON file each.
#[derive(Debug)]
pub struct FileContactRepository {
    contacts_dir: PathBuf,
    /// Next identifier to hand out. The mutex also serialises every write.
    next_id: Mutex<Option<ContactId>>,
}

impl FileContactRepository {
    /// Opens (creating if needed) the contact store under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ContactError` if:
    /// - the `contacts/` directory cannot be created ([`ContactError::StorageDirCreation`])
    /// - the directory cannot be scanned for existing identifiers ([`ContactError::StorageDirRead`])
    /// - the `.last_id` marker cannot be read ([`ContactError::FileRead`]) or does not hold an
    ///   identifier ([`ContactError::CorruptIdMarker`])
    pub fn open(data_dir: &Path) -> ContactResult<Self> {
        let contacts_dir = data_dir.join(CONTACTS_DIR_NAME);
        fs::create_dir_all(&contacts_dir).map_err(ContactError::StorageDirCreation)?;

        let highest_stored = stored_ids(&contacts_dir)?.into_iter().max();
        let last_issued = read_last_issued(&contacts_dir.join(LAST_ISSUED_ID_FILE_NAME))?;
        let next_id = match highest_stored.max(last_issued) {
            Some(id) => id.next(),
            None => Some(ContactId::FIRST),
        };

        tracing::debug!(
            "opened contact store at {} (next id {:?})",
            contacts_dir.display(),
            next_id.map(ContactId::get)
        );

        Ok(Self {
            contacts_dir,
            next_id: Mutex::new(next_id),
        })
    }

    pub fn contacts_dir(&self) -> &Path {
        &self.contacts_dir
    }

    fn path_for(&self, id: ContactId) -> PathBuf {
        self.contacts_dir
            .join(format!("{}.{}", id, CONTACT_FILE_EXTENSION))
    }

    fn lock(&self) -> ContactResult<MutexGuard<'_, Option<ContactId>>> {
        self.next_id.lock().map_err(|_| ContactError::LockPoisoned)
    }

    fn read_contact(path: &Path) -> ContactResult<Contact> {
        let raw = fs::read_to_string(path).map_err(ContactError::FileRead)?;
        serde_json::from_str(&raw).map_err(ContactError::Deserialization)
    }

    fn write_contact(&self, contact: &Contact) -> ContactResult<()> {
        let raw = serde_json::to_string_pretty(contact).map_err(ContactError::Serialization)?;
        write_atomically(&self.path_for(contact.id), &raw)
    }

    fn record_issued(&self, id: ContactId) -> ContactResult<()> {
        write_atomically(
            &self.contacts_dir.join(LAST_ISSUED_ID_FILE_NAME),
            &id.to_string(),
        )
    }
}

/// Write `raw` to a `.tmp` sibling of `target`, then rename it into place.
///
/// The sibling is removed if either step fails.
fn write_atomically(target: &Path, raw: &str) -> ContactResult<()> {
    let mut staging = target.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let result = fs::write(&staging, raw).and_then(|()| fs::rename(&staging, target));
    if let Err(e) = result {
        let _ = fs::remove_file(&staging);
        return Err(ContactError::FileWrite(e));
    }
    Ok(())
}

/// Highest identifier recorded in the marker file, or `None` for a store that predates it.
fn read_last_issued(path: &Path) -> ContactResult<Option<ContactId>> {
    match fs::read_to_string(path) {
        Ok(raw) => ContactId::parse(&raw)
            .map(Some)
            .ok_or_else(|| ContactError::CorruptIdMarker(path.display().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ContactError::FileRead(e)),
    }
}

/// Identifiers of every contact file in `contacts_dir`, in directory order.
fn stored_ids(contacts_dir: &Path) -> ContactResult<Vec<ContactId>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(contacts_dir).map_err(ContactError::StorageDirRead)? {
        let entry = entry.map_err(ContactError::StorageDirRead)?;
        if let Some(id) = id_from_path(&entry.path()) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn id_from_path(path: &Path) -> Option<ContactId> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(CONTACT_FILE_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(ContactId::parse)
}

impl ContactRepository for FileContactRepository {
    fn list(&self) -> ContactResult<Vec<Contact>> {
        let mut ids = stored_ids(&self.contacts_dir)?;
        ids.sort();

        let mut contacts = Vec::with_capacity(ids.len());
        for id in ids {
            let path = self.path_for(id);
            match Self::read_contact(&path) {
                Ok(contact) if contact.id == id => contacts.push(contact),
                Ok(contact) => {
                    tracing::warn!(
                        "skipping {}: file holds contact {}",
                        path.display(),
                        contact.id
                    );
                }
                // Deleted between the directory scan and the read.
                Err(ContactError::FileRead(e)) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("failed to read contact {}: {}", path.display(), e);
                }
            }
        }
        Ok(contacts)
    }

    fn get(&self, id: ContactId) -> ContactResult<Contact> {
        let path = self.path_for(id);
        match Self::read_contact(&path) {
            Ok(contact) if contact.id == id => Ok(contact),
            Ok(contact) => {
                tracing::warn!(
                    "ignoring {}: file holds contact {}",
                    path.display(),
                    contact.id
                );
                Err(ContactError::NotFound(id))
            }
            Err(ContactError::FileRead(e)) if e.kind() == ErrorKind::NotFound => {
                Err(ContactError::NotFound(id))
            }
            Err(e) => Err(e),
        }
    }

    fn create(&self, fields: ContactFields) -> ContactResult<Contact> {
        let mut next_id = self.lock()?;

        // Skip over files that appeared outside this process since the store was opened.
        for _attempt in 0..MAX_CREATE_ATTEMPTS {
            let id = next_id.ok_or(ContactError::IdExhausted)?;
            *next_id = id.next();

            if self.path_for(id).exists() {
                continue;
            }

            self.record_issued(id)?;
            let contact = Contact { id, fields };
            self.write_contact(&contact)?;
            return Ok(contact);
        }

        Err(ContactError::FileWrite(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("failed to allocate a free contact id after {MAX_CREATE_ATTEMPTS} attempts"),
        )))
    }

    fn update(&self, id: ContactId, fields: ContactFields) -> ContactResult<Contact> {
        let _guard = self.lock()?;
        if !self.path_for(id).is_file() {
            return Err(ContactError::NotFound(id));
        }

        let contact = Contact { id, fields };
        self.write_contact(&contact)?;
        Ok(contact)
    }

    fn delete(&self, id: ContactId) -> ContactResult<()> {
        let _guard = self.lock()?;
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ContactError::NotFound(id)),
            Err(e) => Err(ContactError::FileRemove(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::FieldValue;
    use crate::repositories::contract::{assert_crud_contract, fields};
    use tempfile::TempDir;

    #[test]
    fn test_file_repository_honours_contract() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = FileContactRepository::open(temp_dir.path()).expect("open should succeed");
        assert_crud_contract(&repo);
    }

    #[test]
    fn test_open_creates_contacts_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = FileContactRepository::open(temp_dir.path()).expect("open should succeed");
        assert!(repo.contacts_dir().is_dir());
        assert_eq!(repo.contacts_dir(), temp_dir.path().join(CONTACTS_DIR_NAME));
    }

    #[test]
    fn test_contacts_survive_reopen_and_ids_continue() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let first = {
            let repo = FileContactRepository::open(temp_dir.path()).unwrap();
            repo.create(fields("Alice", "a@x.com")).unwrap();
            repo.create(fields("Bob", "b@x.com")).unwrap()
        };

        let repo = FileContactRepository::open(temp_dir.path()).unwrap();
        assert_eq!(repo.get(first.id).unwrap(), first);

        let next = repo.create(fields("Carol", "c@x.com")).unwrap();
        assert_eq!(next.id.get(), first.id.get() + 1);
    }

    #[test]
    fn test_create_skips_externally_created_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = FileContactRepository::open(temp_dir.path()).unwrap();

        fs::write(repo.contacts_dir().join("1.json"), "{}").unwrap();

        let created = repo.create(fields("Alice", "a@x.com")).unwrap();
        assert_eq!(created.id.get(), 2);
    }

    #[test]
    fn test_list_skips_corrupt_and_foreign_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = FileContactRepository::open(temp_dir.path()).unwrap();
        let alice = repo.create(fields("Alice", "a@x.com")).unwrap();

        fs::write(repo.contacts_dir().join("7.json"), "not json").unwrap();
        fs::write(repo.contacts_dir().join("notes.txt"), "hello").unwrap();
        fs::write(repo.contacts_dir().join("abc.json"), "{}").unwrap();

        let listed = repo.list().unwrap();
        assert_eq!(listed, vec![alice]);
    }

    #[test]
    fn test_no_staging_files_left_after_write() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = FileContactRepository::open(temp_dir.path()).unwrap();
        let contact = repo.create(fields("Alice", "a@x.com")).unwrap();
        let mut changed = contact.fields.clone();
        changed.insert("name", FieldValue::Text("Alicia".into()));
        repo.update(contact.id, changed).unwrap();

        let mut names: Vec<_> = fs::read_dir(repo.contacts_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![".last_id".to_string(), "1.json".to_string()]);
    }

    #[test]
    fn test_deleted_ids_stay_retired_after_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let bob = {
            let repo = FileContactRepository::open(temp_dir.path()).unwrap();
            repo.create(fields("Alice", "a@x.com")).unwrap();
            let bob = repo.create(fields("Bob", "b@x.com")).unwrap();
            repo.delete(bob.id).unwrap();
            bob
        };

        let repo = FileContactRepository::open(temp_dir.path()).unwrap();
        let carol = repo.create(fields("Carol", "c@x.com")).unwrap();
        assert_eq!(carol.id.get(), bob.id.get() + 1);

        assert!(matches!(
            repo.delete(bob.id),
            Err(ContactError::NotFound(id)) if id == bob.id
        ));
        assert_eq!(repo.get(carol.id).unwrap(), carol);
    }

    #[test]
    fn test_open_rejects_corrupt_id_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let contacts_dir = temp_dir.path().join(CONTACTS_DIR_NAME);
        fs::create_dir_all(&contacts_dir).unwrap();
        fs::write(contacts_dir.join(LAST_ISSUED_ID_FILE_NAME), "seven").unwrap();

        let err = FileContactRepository::open(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ContactError::CorruptIdMarker(_)));
    }

    #[test]
    fn test_get_ignores_file_holding_another_contact() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = FileContactRepository::open(temp_dir.path()).unwrap();
        let alice = repo.create(fields("Alice", "a@x.com")).unwrap();

        fs::copy(
            repo.contacts_dir().join("1.json"),
            repo.contacts_dir().join("5.json"),
        )
        .unwrap();
        let five = ContactId::new(5).unwrap();

        assert!(matches!(repo.get(five), Err(ContactError::NotFound(id)) if id == five));
        assert_eq!(repo.list().unwrap(), vec![alice]);
    }

    #[test]
    fn test_failed_write_removes_staging_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let target = temp_dir.path().join("1.json");
        // A non-empty directory in the way makes the rename fail.
        fs::create_dir_all(target.join("occupied")).unwrap();

        let err = write_atomically(&target, "{}").unwrap_err();
        assert!(matches!(err, ContactError::FileWrite(_)));
        assert!(!temp_dir.path().join("1.json.tmp").exists());
        assert!(target.is_dir());
    }
}
