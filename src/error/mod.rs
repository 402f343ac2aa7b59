//! Error handling for student record operations.
//!
//! This module provides:
//! - The two domain errors raised by the service (`NotFound`, `AlreadyExists`)
//! - Infrastructure error kinds for connection, configuration and execution
//! - Structured JSON rendering of MongoDB driver errors
//!
//! # Example
//!
//! ```rust,no_run
//! use students::error::{Result, StudentsError};
//!
//! fn require(found: bool, id: i64) -> Result<()> {
//!     if !found {
//!         return Err(StudentsError::NotFound(id));
//!     }
//!     Ok(())
//! }
//! ```

pub mod kinds;
pub mod mongo;

pub(crate) use kinds::map_insert_error;
pub use kinds::{ConfigError, ConnectionError, ExecutionError, Result, StudentsError};
pub use mongo::{ErrorDetails, ErrorInfo, extract_error_info, is_duplicate_key};
