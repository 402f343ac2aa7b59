//! Command-line interface for the students service
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and argument overrides
//! - Dispatching one subcommand per service operation
//! - Rendering results through the configured formatter

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::{ConfigError, Result, StudentsError};
use crate::formatter::Formatter;
use crate::model::Mark;
use crate::repository::StudentRepository;
use crate::service::StudentsService;

/// Student marks service over MongoDB
#[derive(Parser, Debug)]
#[command(
    name = "students",
    version,
    about = "Student marks service over MongoDB",
    long_about = "Registers students, records their marks and answers analytical
queries over a MongoDB students collection."
)]
pub struct CliArgs {
    /// MongoDB connection URI
    ///
    /// Format: mongodb://[username:password@]host[:port][/?options]
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Database name to use
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// Students collection name
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format (json, json-pretty, table)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Operation to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Service operations
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Register a new student
    Add {
        id: i64,
        name: String,
        phone: String,
    },

    /// Replace a student's phone number
    UpdatePhone { id: i64, phone: String },

    /// Append a mark to a student
    AddMark {
        id: i64,
        subject: String,
        /// Mark date (YYYY-MM-DD)
        date: NaiveDate,
        #[arg(allow_negative_numbers = true)]
        score: i32,
    },

    /// Remove a student together with all marks
    Remove { id: i64 },

    /// List all marks of a student
    Marks { id: i64 },

    /// Find the student owning a phone number
    ByPhone { phone: String },

    /// List students whose phone starts with a prefix
    PhonePrefix { prefix: String },

    /// List students whose every mark is above a threshold
    GoodMarks {
        #[arg(default_value_t = 80, allow_negative_numbers = true)]
        threshold: i32,
    },

    /// List students with fewer marks than given
    FewMarks { n_marks: u32 },

    /// List students whose marks in a subject are all at least a threshold
    GoodMarksSubject {
        subject: String,
        #[arg(allow_negative_numbers = true)]
        threshold: i32,
    },

    /// List students whose mark count lies in a range
    MarksBetween { min: u32, max: u32 },

    /// List a student's marks in one subject
    SubjectMarks { id: i64, subject: String },

    /// List names with an average score above a threshold
    AvgAbove {
        #[arg(allow_negative_numbers = true)]
        threshold: i32,
    },

    /// List a student's marks between two dates, both inclusive
    MarksAtDates {
        id: i64,
        /// First date (YYYY-MM-DD)
        from: NaiveDate,
        /// Last date (YYYY-MM-DD)
        to: NaiveDate,
    },

    /// Top students by number of marks above 80
    Best { n: u32 },

    /// Bottom students by total score
    Worst { n: u32 },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from process arguments
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file, environment and arguments
    ///
    /// A missing explicit file is an error. A file that cannot be parsed or
    /// fails validation is replaced by defaults with a warning.
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = match Config::load_from_file(args.config_file.as_deref()) {
            Ok(config) => config,
            Err(e @ StudentsError::Config(ConfigError::InvalidFormat(_))) => {
                eprintln!("Warning: Failed to load configuration: {}", e);
                eprintln!("Using default configuration instead.");
                Config::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env();

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Connection URI with credentials hidden, for display
    pub fn get_sanitized_connection_uri(&self) -> String {
        sanitize_uri(&self.config.connection.uri)
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(uri) = &args.uri {
            config.connection.uri = uri.clone();
        }
        if let Some(database) = &args.database {
            config.connection.database = database.clone();
        }
        if let Some(collection) = &args.collection {
            config.connection.collection = collection.clone();
        }
        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }

        if let Some(format_str) = &args.format {
            config.display.format = Self::parse_output_format(format_str, config.display.format);
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else {
            config.logging.level
        };
    }

    /// Parse output format string, keeping `fallback` when unknown
    fn parse_output_format(format_str: &str, fallback: OutputFormat) -> OutputFormat {
        format_str.parse().unwrap_or_else(|_| {
            eprintln!("Warning: Unknown format '{}', using default", format_str);
            fallback
        })
    }

    /// Handle commands that need no database connection
    ///
    /// # Returns
    /// * `Result<bool>` - True if the command was handled, false to continue
    pub fn handle_local_command(&self) -> Result<bool> {
        match &self.args.command {
            Commands::Config { show, validate } => {
                if *validate {
                    self.config.validate()?;
                    println!("Configuration is valid");
                }
                if *show || !*validate {
                    println!("Configuration file: {}", self.get_config_path().display());
                    println!();
                    println!("{}", self.config.to_toml_string()?);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }

    /// Run the selected command against a service and render its result
    pub async fn execute<R: StudentRepository>(
        &self,
        service: &StudentsService<R>,
    ) -> Result<String> {
        run_command(
            service,
            &self.args.command,
            &Formatter::from_config(&self.config.display),
        )
        .await
    }
}

/// Run one command against a service and render its result
///
/// # Arguments
/// * `service` - Service executing the operation
/// * `command` - Parsed command
/// * `formatter` - Output formatter
pub async fn run_command<R: StudentRepository>(
    service: &StudentsService<R>,
    command: &Commands,
    formatter: &Formatter,
) -> Result<String> {
    match command {
        Commands::Add { id, name, phone } => {
            let student = service
                .add_student(crate::model::Student::new(*id, name, phone))
                .await?;
            formatter.format_record(&student)
        }
        Commands::UpdatePhone { id, phone } => {
            formatter.format_record(&service.update_phone(*id, phone).await?)
        }
        Commands::AddMark {
            id,
            subject,
            date,
            score,
        } => {
            let marks = service
                .add_mark(*id, Mark::new(subject, *date, *score))
                .await?;
            formatter.format_rows(&marks)
        }
        Commands::Remove { id } => formatter.format_record(&service.remove_student(*id).await?),
        Commands::Marks { id } => formatter.format_rows(&service.get_marks(*id).await?),
        Commands::ByPhone { phone } => {
            let found = service.get_student_by_phone(phone).await?;
            formatter.format_optional(found.as_ref())
        }
        Commands::PhonePrefix { prefix } => {
            formatter.format_rows(&service.get_students_by_phone_prefix(prefix).await?)
        }
        Commands::GoodMarks { threshold } => {
            formatter.format_rows(&service.get_students_all_good_marks(*threshold).await?)
        }
        Commands::FewMarks { n_marks } => {
            formatter.format_rows(&service.get_students_few_marks(*n_marks).await?)
        }
        Commands::GoodMarksSubject { subject, threshold } => formatter.format_rows(
            &service
                .get_students_all_good_marks_subject(subject, *threshold)
                .await?,
        ),
        Commands::MarksBetween { min, max } => formatter.format_rows(
            &service
                .get_students_marks_amount_between(*min, *max)
                .await?,
        ),
        Commands::SubjectMarks { id, subject } => {
            formatter.format_rows(&service.get_student_subject_marks(*id, subject).await?)
        }
        Commands::AvgAbove { threshold } => {
            formatter.format_rows(&service.get_student_avg_score_greater(*threshold).await?)
        }
        Commands::MarksAtDates { id, from, to } => formatter.format_rows(
            &service
                .get_student_marks_at_dates(*id, *from, *to)
                .await?,
        ),
        Commands::Best { n } => {
            formatter.format_lines("student", &service.get_best_students(*n).await?)
        }
        Commands::Worst { n } => {
            formatter.format_lines("student", &service.get_worst_students(*n).await?)
        }
        Commands::Config { .. } => Ok(String::new()),
    }
}

/// Hide credentials between `://` and `@`
fn sanitize_uri(uri: &str) -> String {
    if let Some(proto_end) = uri.find("://") {
        if let Some(host_start) = uri.rfind('@') {
            if host_start > proto_end {
                return format!("{}***{}", &uri[..proto_end + 3], &uri[host_start..]);
            }
        }
    }
    uri.to_string()
}
