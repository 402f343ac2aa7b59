//! Students - student marks service over MongoDB
//!
//! Each invocation runs one service operation and prints the result.
//!
//! # Usage
//!
//! ```bash
//! students add 1 Vasya 050-1111111
//! students add-mark 1 Math 2024-01-10 90
//! students --format json best 3
//! ```

use tracing::{Level, info};

use students::cli::CliInterface;
use students::connection::ConnectionManager;
use students::error::Result;
use students::repository::MongoStudentRepository;
use students::service::StudentsService;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle local subcommands or connect and run the operation
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_local_command()? {
        return Ok(());
    }

    let mut conn_manager = ConnectionManager::new(cli.config().connection.clone());
    info!("Connecting to: {}", cli.get_sanitized_connection_uri());
    conn_manager.connect().await?;

    // Always disconnect, whatever the operation result
    let outcome = run_operation(&cli, &conn_manager).await;
    conn_manager.disconnect().await?;

    println!("{}", outcome?);
    Ok(())
}

/// Build the service over the configured collection and run the command
async fn run_operation(cli: &CliInterface, conn_manager: &ConnectionManager) -> Result<String> {
    let database = conn_manager.get_database()?;
    let repository = MongoStudentRepository::new(&database, &cli.config().connection.collection);
    repository.ensure_indexes().await?;

    let service = StudentsService::new(repository);
    cli.execute(&service).await
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Logs go to stderr so command output stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
