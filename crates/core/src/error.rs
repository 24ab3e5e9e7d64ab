use crate::contact::ContactId;

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid contact schema: {0}")]
    InvalidSchema(String),
    #[error("contact {0} not found")]
    NotFound(ContactId),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read storage directory: {0}")]
    StorageDirRead(std::io::Error),
    #[error("failed to write contact file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read contact file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove contact file: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize contact: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize contact: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to read schema file: {0}")]
    SchemaRead(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),

    #[error("identifier marker {0} is corrupt")]
    CorruptIdMarker(String),
    #[error("contact store lock poisoned")]
    LockPoisoned,
    #[error("contact identifier space exhausted")]
    IdExhausted,
}

pub type ContactResult<T> = std::result::Result<T, ContactError>;
