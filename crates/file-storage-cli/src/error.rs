//! Error types for the file storage CLI

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Storage(file_storage::FileStorageError),
    Database(Box<sqlx::Error>),
    Io(Box<std::io::Error>),
    Config(String),
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Storage(err) => write!(f, "{}", err),
            CliError::Database(err) => write!(f, "Database error: {}", err),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Storage(err) => Some(err),
            CliError::Database(err) => Some(err.as_ref()),
            CliError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<file_storage::FileStorageError> for CliError {
    fn from(err: file_storage::FileStorageError) -> Self {
        CliError::Storage(err)
    }
}

impl From<sqlx::Error> for CliError {
    fn from(err: sqlx::Error) -> Self {
        CliError::Database(Box::new(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_passes_through() {
        let err = CliError::from(file_storage::FileStorageError::NotFound("a/b".to_string()));
        assert_eq!(format!("{}", err), "File not found: a/b");
    }

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("bad filter".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad filter");
    }

    #[test]
    fn test_database_error_has_source() {
        let err = CliError::from(sqlx::Error::PoolTimedOut);
        assert!(std::error::Error::source(&err).is_some());
    }
}
