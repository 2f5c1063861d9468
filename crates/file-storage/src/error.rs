//! Error types for the file storage façade

use std::fmt;

#[derive(Debug)]
pub enum FileStorageError {
    /// No record exists for the given (normalized) name
    NotFound(String),
    /// The operation is not meaningful for this backend
    Unsupported(&'static str),
    /// A cache backend was configured but could not be used
    AdapterUnavailable(String),
    /// The record store failed for a reason other than a missing record
    StoreFailure(Box<dyn std::error::Error + Send + Sync>),
    /// Reading the uploaded content failed
    Io(Box<std::io::Error>),
}

impl FileStorageError {
    /// Wrap an arbitrary record store failure
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FileStorageError::StoreFailure(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FileStorageError::NotFound(_))
    }
}

impl fmt::Display for FileStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStorageError::NotFound(name) => write!(f, "File not found: {}", name),
            FileStorageError::Unsupported(op) => write!(f, "Unsupported operation: {}", op),
            FileStorageError::AdapterUnavailable(msg) => {
                write!(f, "Cache adapter unavailable: {}", msg)
            }
            FileStorageError::StoreFailure(err) => write!(f, "Record store error: {}", err),
            FileStorageError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for FileStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileStorageError::StoreFailure(err) => Some(err.as_ref()),
            FileStorageError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for FileStorageError {
    fn from(err: sqlx::Error) -> Self {
        FileStorageError::StoreFailure(Box::new(err))
    }
}

impl From<std::io::Error> for FileStorageError {
    fn from(err: std::io::Error) -> Self {
        FileStorageError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FileStorageError>;
