//! Students Library
//!
//! Student records with marks stored in a MongoDB collection, and the
//! service that maintains them and answers analytical queries.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `formatter`: Output formatting and display
//! - `model`: Public record types returned by the service
//! - `query`: Filter documents and aggregation pipelines
//! - `repository`: Storage seam with MongoDB and in-memory backends
//! - `service`: Student operations enforcing existence rules
//! - `store`: Stored document shapes and date conversion
//!
//! # Example
//!
//! ```no_run
//! use students::{config::Config, connection::ConnectionManager};
//! use students::{MongoStudentRepository, StudentsService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let mut manager = ConnectionManager::new(config.connection.clone());
//!     manager.connect().await?;
//!
//!     let database = manager.get_database()?;
//!     let repository = MongoStudentRepository::new(&database, &config.connection.collection);
//!     repository.ensure_indexes().await?;
//!
//!     let service = StudentsService::new(repository);
//!     for line in service.get_best_students(3).await? {
//!         println!("{line}");
//!     }
//!
//!     manager.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod model;
pub mod query;
pub mod repository;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{Result, StudentsError};
pub use formatter::Formatter;
pub use model::{Mark, NameAvgScore, Student};
pub use repository::{InMemoryStudentRepository, MongoStudentRepository, StudentRepository};
pub use service::StudentsService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
