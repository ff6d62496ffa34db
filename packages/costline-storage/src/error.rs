//! Error types for costline-storage

use std::fmt;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Database errors (SQLite)
    Database,
    /// Serialization/deserialization errors
    Serialization,
    /// Project not found
    ProjectNotFound,
    /// Area not found
    AreaNotFound,
    /// Group not found
    GroupNotFound,
    /// Line item not found
    LineItemNotFound,
    /// Line item option not found
    OptionNotFound,
    /// Area template not found
    TemplateNotFound,
    /// Transaction errors (a batch was rolled back)
    Transaction,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::ProjectNotFound => "project_not_found",
            ErrorKind::AreaNotFound => "area_not_found",
            ErrorKind::GroupNotFound => "group_not_found",
            ErrorKind::LineItemNotFound => "line_item_not_found",
            ErrorKind::OptionNotFound => "option_not_found",
            ErrorKind::TemplateNotFound => "template_not_found",
            ErrorKind::Transaction => "transaction",
        }
    }

    /// True for the `*NotFound` family - surfaced to callers as client errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorKind::ProjectNotFound
                | ErrorKind::AreaNotFound
                | ErrorKind::GroupNotFound
                | ErrorKind::LineItemNotFound
                | ErrorKind::OptionNotFound
                | ErrorKind::TemplateNotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction, message)
    }

    pub fn project_not_found(project_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::ProjectNotFound,
            format!("Project not found: {}", project_id.into()),
        )
    }

    pub fn area_not_found(area_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::AreaNotFound,
            format!("Area not found: {}", area_id.into()),
        )
    }

    pub fn group_not_found(group_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::GroupNotFound,
            format!("Group not found: {}", group_id.into()),
        )
    }

    pub fn line_item_not_found(line_item_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::LineItemNotFound,
            format!("Line item not found: {}", line_item_id.into()),
        )
    }

    pub fn option_not_found(option_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::OptionNotFound,
            format!("Line item option not found: {}", option_id.into()),
        )
    }

    pub fn template_not_found(template_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::TemplateNotFound,
            format!("Area template not found: {}", template_id.into()),
        )
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

// JSON error conversions
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = StorageError::area_not_found("area-17");
        let msg = format!("{}", err);
        assert!(msg.contains("area_not_found"));
        assert!(msg.contains("area-17"));
    }

    #[test]
    fn test_database_error() {
        let err = StorageError::database("Connection failed");
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(err.message, "Connection failed");
        assert!(err.source.is_none());

        let msg = format!("{}", err);
        assert_eq!(msg, "[database] Connection failed");
    }

    #[test]
    fn test_transaction_error() {
        let err = StorageError::transaction("batch rolled back");
        assert_eq!(err.kind, ErrorKind::Transaction);

        let msg = format!("{}", err);
        assert_eq!(msg, "[transaction] batch rolled back");
    }

    #[test]
    fn test_not_found_family() {
        assert!(StorageError::group_not_found("g1").kind.is_not_found());
        assert!(StorageError::line_item_not_found("li1").kind.is_not_found());
        assert!(StorageError::option_not_found("o1").kind.is_not_found());
        assert!(!StorageError::database("boom").kind.is_not_found());
        assert!(!StorageError::transaction("boom").kind.is_not_found());
    }

    #[test]
    fn test_with_source() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StorageError::database("DB file missing").with_source(io_err);

        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.source.is_some());

        let source = err.source().unwrap();
        assert!(source.to_string().contains("file not found"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_from_rusqlite_error() {
        use rusqlite::Error as SqliteError;

        let sqlite_err = SqliteError::QueryReturnedNoRows;
        let err: StorageError = sqlite_err.into();

        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.contains("SQLite error"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(StorageError::area_not_found("a1"))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::AreaNotFound);
    }
}
