use std::{fmt, io};

use crate::error::mongo::{format_mongodb_error, is_duplicate_key};

/// Crate-wide `Result` type using [`StudentsError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, StudentsError>;

/// Top-level error type for student record operations.
///
/// The two domain kinds, [`StudentsError::NotFound`] and
/// [`StudentsError::AlreadyExists`], are raised by the service; the rest wrap
/// infrastructure failures.
#[derive(Debug)]
pub enum StudentsError {
    /// Referenced student id does not exist.
    NotFound(i64),

    /// A student with this id is already registered.
    AlreadyExists(i64),

    /// Connection-related errors.
    Connection(ConnectionError),

    /// Query or pipeline execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),

    /// Not currently connected to MongoDB.
    NotConnected,

    /// Ping command failed.
    PingFailed(String),
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecutionError {
    /// Query execution failed.
    QueryFailed(String),

    /// Cursor error.
    CursorError(String),

    /// A stored or aggregated document did not have the expected shape.
    Decode(String),

    /// A value could not be converted to BSON.
    Encode(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl StudentsError {
    /// True for the `NotFound` domain error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StudentsError::NotFound(_))
    }

    /// True for the `AlreadyExists` domain error.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StudentsError::AlreadyExists(_))
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for StudentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentsError::NotFound(id) => write!(f, "Student {id} not found"),
            StudentsError::AlreadyExists(id) => write!(f, "Student {id} already exists"),
            StudentsError::Connection(e) => write!(f, "Connection error: {e}"),
            StudentsError::Execution(e) => write!(f, "Execution error: {e}"),
            StudentsError::Config(e) => write!(f, "Configuration error: {e}"),
            StudentsError::Io(e) => write!(f, "I/O error: {e}"),
            StudentsError::MongoDb(e) => format_mongodb_error(f, e),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::NotConnected => write!(f, "Not connected to MongoDB"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            ExecutionError::CursorError(msg) => write!(f, "Cursor error: {msg}"),
            ExecutionError::Decode(msg) => write!(f, "Malformed document: {msg}"),
            ExecutionError::Encode(msg) => write!(f, "Cannot encode document: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for StudentsError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to StudentsError ========================= */

impl From<io::Error> for StudentsError {
    fn from(err: io::Error) -> Self {
        StudentsError::Io(err)
    }
}

impl From<mongodb::error::Error> for StudentsError {
    fn from(err: mongodb::error::Error) -> Self {
        StudentsError::MongoDb(err)
    }
}

impl From<bson::de::Error> for StudentsError {
    fn from(err: bson::de::Error) -> Self {
        StudentsError::Execution(ExecutionError::Decode(err.to_string()))
    }
}

impl From<bson::ser::Error> for StudentsError {
    fn from(err: bson::ser::Error) -> Self {
        StudentsError::Execution(ExecutionError::Encode(err.to_string()))
    }
}

impl From<ConnectionError> for StudentsError {
    fn from(err: ConnectionError) -> Self {
        StudentsError::Connection(err)
    }
}

impl From<ExecutionError> for StudentsError {
    fn from(err: ExecutionError) -> Self {
        StudentsError::Execution(err)
    }
}

impl From<ConfigError> for StudentsError {
    fn from(err: ConfigError) -> Self {
        StudentsError::Config(err)
    }
}

/// Map a driver error raised while creating student `id`.
///
/// A duplicate-key rejection from the unique `id` index means another writer
/// registered the same id first.
pub(crate) fn map_insert_error(id: i64, err: mongodb::error::Error) -> StudentsError {
    if is_duplicate_key(&err) {
        StudentsError::AlreadyExists(id)
    } else {
        StudentsError::MongoDb(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_messages() {
        assert_eq!(StudentsError::NotFound(10).to_string(), "Student 10 not found");
        assert_eq!(
            StudentsError::AlreadyExists(8).to_string(),
            "Student 8 already exists"
        );
    }

    #[test]
    fn test_domain_error_predicates() {
        assert!(StudentsError::NotFound(1).is_not_found());
        assert!(!StudentsError::NotFound(1).is_already_exists());
        assert!(StudentsError::AlreadyExists(1).is_already_exists());
        assert!(!StudentsError::AlreadyExists(1).is_not_found());
    }

    #[test]
    fn test_nested_error_display() {
        let err: StudentsError = ConfigError::InvalidValue {
            field: "connection.max_pool_size".to_string(),
            value: "0".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value '0' for field 'connection.max_pool_size'"
        );

        let err: StudentsError = ExecutionError::Decode("missing field `id`".into()).into();
        assert!(err.to_string().contains("missing field `id`"));
    }
}
