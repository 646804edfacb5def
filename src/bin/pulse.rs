//! Pulse CLI - Command-line interface for Learnpulse
//!
//! Commands:
//! - precompute: Compute the per-user feature lookup table (batch mode)
//! - dataset: Build the training matrix with completion labels
//! - validate: Validate activity-log records
//! - schema: Print schema information
//! - doctor: Diagnose engine health and artifacts

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use learnpulse::schema::{ActivityLogAdapter, ValidationIssue};
use learnpulse::store::FeatureStore;
use learnpulse::{
    build_training_set, compute_feature_table, EngineError, RawEvent, RawSubmission,
    ENGINE_VERSION, FEATURE_COUNT, PRODUCER_NAME, SCHEMA_VERSION,
};

/// Pulse - Feature extraction engine for course-completion prediction
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Transform course activity logs into prediction features", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the per-user feature lookup table (batch mode)
    Precompute {
        /// Event log path (use - for stdin)
        #[arg(long)]
        events: PathBuf,

        /// Submission log path
        #[arg(long)]
        submissions: PathBuf,

        /// Output path for the lookup table (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,
    },

    /// Build the training matrix with completion labels
    Dataset {
        /// Event log path (use - for stdin)
        #[arg(long)]
        events: PathBuf,

        /// Submission log path
        #[arg(long)]
        submissions: PathBuf,

        /// Output path for the training set (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Validate activity-log records
    Validate {
        /// Event log path (use - for stdin)
        #[arg(long)]
        events: Option<PathBuf>,

        /// Submission log path
        #[arg(long)]
        submissions: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },

    /// Diagnose engine health and artifacts
    Doctor {
        /// Check a persisted feature lookup table
        #[arg(long)]
        features: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Comma-separated values with a header row (platform export)
    Csv,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (course.activity.v1)
    Input,
    /// Output schema (feature lookup table / training set)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Precompute {
            events,
            submissions,
            output,
            input_format,
        } => cmd_precompute(&events, &submissions, &output, input_format),

        Commands::Dataset {
            events,
            submissions,
            output,
            input_format,
            pretty,
        } => cmd_dataset(&events, &submissions, &output, input_format, pretty),

        Commands::Validate {
            events,
            submissions,
            input_format,
            json,
        } => cmd_validate(events.as_deref(), submissions.as_deref(), input_format, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),

        Commands::Doctor { features, json } => cmd_doctor(features.as_deref(), json),
    }
}

fn cmd_precompute(
    events_path: &Path,
    submissions_path: &Path,
    output: &Path,
    input_format: InputFormat,
) -> Result<(), PulseCliError> {
    let events = load_events(events_path, &input_format)?;
    let submissions = load_submissions(submissions_path, &input_format)?;

    if events.is_empty() {
        return Err(PulseCliError::NoRecords);
    }

    let table = compute_feature_table(&events, &submissions);
    let store = FeatureStore::from_table(table);

    if output.to_string_lossy() == "-" {
        print!("{}", store.to_json().map_err(PulseCliError::Engine)?);
    } else {
        store.save(output).map_err(PulseCliError::Engine)?;
    }

    Ok(())
}

fn cmd_dataset(
    events_path: &Path,
    submissions_path: &Path,
    output: &Path,
    input_format: InputFormat,
    pretty: bool,
) -> Result<(), PulseCliError> {
    let events = load_events(events_path, &input_format)?;
    let submissions = load_submissions(submissions_path, &input_format)?;

    if events.is_empty() {
        return Err(PulseCliError::NoRecords);
    }

    let training = build_training_set(&events, &submissions);
    let payload = if pretty {
        serde_json::to_string_pretty(&training)?
    } else {
        serde_json::to_string(&training)?
    };

    if output.to_string_lossy() == "-" {
        print!("{}", payload);
    } else {
        write_atomic(output, &payload)?;
    }

    Ok(())
}

fn cmd_validate(
    events_path: Option<&Path>,
    submissions_path: Option<&Path>,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PulseCliError> {
    let mut total = 0usize;
    let mut issues: Vec<ReportedIssue> = Vec::new();

    if let Some(path) = events_path {
        let events = load_events(path, &input_format)?;
        total += events.len();
        issues.extend(
            ActivityLogAdapter::validate_events(&events)
                .into_iter()
                .map(|issue| ReportedIssue::new("event", issue)),
        );
    }

    if let Some(path) = submissions_path {
        let submissions = load_submissions(path, &input_format)?;
        total += submissions.len();
        issues.extend(
            ActivityLogAdapter::validate_submissions(&submissions)
                .into_iter()
                .map(|issue| ReportedIssue::new("submission", issue)),
        );
    }

    let report = ValidationReport {
        total_records: total,
        valid_records: total - issues.len(),
        invalid_records: issues.len(),
        errors: issues,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - {} {} (user {}): {}",
                    err.kind, err.index, err.user_id, err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), PulseCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SCHEMA_VERSION);
            println!();
            println!("Two record kinds, one row per record:");
            println!();
            println!("1. event - step interactions");
            println!("   columns: user_id, step_id, timestamp, action");
            println!("   actions: viewed, passed, discovered, started_attempt (open set)");
            println!();
            println!("2. submission - quiz attempts");
            println!("   columns: user_id, step_id, timestamp, submission_status");
            println!("   statuses: correct, wrong (open set)");
            println!();
            println!("Timestamps are epoch seconds. Duplicate rows are significant.");
        }
        SchemaType::Output => {
            println!("Output Schemas");
            println!();
            println!("Feature lookup table (precompute):");
            println!("  {{ \"<user_id>\": {{ <{} named features> }}, ... }}", FEATURE_COUNT);
            println!("  Features, in order: 13 base aggregates followed by 6 frozen");
            println!("  interaction terms. Every value is a finite number.");
            println!();
            println!("Training set (dataset):");
            println!("  manifest: {{ producer, version, run_id, computed_at_utc }}");
            println!("  feature_names: the shared {}-name schema", FEATURE_COUNT);
            println!("  user_ids / rows / targets: aligned by index");
        }
    }

    Ok(())
}

fn cmd_doctor(features: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Learnpulse version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(features_path) = features {
        if features_path.exists() {
            match FeatureStore::load(features_path) {
                Ok(store) => {
                    checks.push(DoctorCheck {
                        name: "feature_store".to_string(),
                        status: CheckStatus::Ok,
                        message: format!("Lookup table valid ({} users)", store.len()),
                    });
                }
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "feature_store".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid lookup table: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "feature_store".to_string(),
                status: CheckStatus::Warning,
                message: "Lookup table file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, PulseCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        if !path.exists() {
            return Err(PulseCliError::Engine(EngineError::DataNotFound(
                path.display().to_string(),
            )));
        }
        Ok(fs::read_to_string(path)?)
    }
}

fn load_events(path: &Path, format: &InputFormat) -> Result<Vec<RawEvent>, PulseCliError> {
    let data = read_input(path)?;
    let events = match format {
        InputFormat::Csv => ActivityLogAdapter::parse_events_csv(&data)?,
        InputFormat::Ndjson => ActivityLogAdapter::parse_events_ndjson(&data)?,
        InputFormat::Json => ActivityLogAdapter::parse_events_array(&data)?,
    };
    Ok(events)
}

fn load_submissions(
    path: &Path,
    format: &InputFormat,
) -> Result<Vec<RawSubmission>, PulseCliError> {
    let data = read_input(path)?;
    let submissions = match format {
        InputFormat::Csv => ActivityLogAdapter::parse_submissions_csv(&data)?,
        InputFormat::Ndjson => ActivityLogAdapter::parse_submissions_ndjson(&data)?,
        InputFormat::Json => ActivityLogAdapter::parse_submissions_array(&data)?,
    };
    Ok(submissions)
}

/// Write through a sibling temporary file so a failed run never leaves a
/// partial output behind.
fn write_atomic(path: &Path, contents: &str) -> Result<(), PulseCliError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<EngineError> for PulseCliError {
    fn from(e: EngineError) -> Self {
        PulseCliError::Engine(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Engine(EngineError::DataNotFound(path)) => CliError {
                code: "DATA_NOT_FOUND".to_string(),
                message: format!("Input data not found: {}", path),
                hint: Some("Check that the log export paths exist".to_string()),
            },
            PulseCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches the {} schema", SCHEMA_VERSION)),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure the event log is not empty".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ReportedIssue>,
}

#[derive(serde::Serialize)]
struct ReportedIssue {
    kind: &'static str,
    index: usize,
    user_id: u64,
    error: String,
}

impl ReportedIssue {
    fn new(kind: &'static str, issue: ValidationIssue) -> Self {
        Self {
            kind,
            index: issue.index,
            user_id: issue.user_id,
            error: issue.error.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
