//! Motor CLI - Command-line interface for Synheart Motor
//!
//! Commands:
//! - tapping: Derive finger-tapping features from key event records
//! - wearable: Derive pronation-supination features from gyroscope records
//! - validate: Check input records without deriving features
//! - config: Print the effective analysis configuration
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use synheart_motor::encoder::OUTPUT_SCHEMA_VERSION;
use synheart_motor::schema::{RecordReader, RejectedRecord, TappingRecord, Timeslots, WearableRecord};
use synheart_motor::{AnalysisConfig, MotorError, MotorPayload, MotorProcessor, MOTOR_VERSION, PRODUCER_NAME};

/// Motor - Motor-symptom feature extraction for finger-tapping and wearable recordings
#[derive(Parser)]
#[command(name = "motor")]
#[command(author = "Synheart AI Inc")]
#[command(version = MOTOR_VERSION)]
#[command(about = "Extract motor-symptom features from tapping and gyroscope recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive tapping features (JSON array or NDJSON of tapping records)
    Tapping {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Analysis configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Derive wearable features (JSON array or NDJSON of wearable records)
    Wearable {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Per-subject task timeslots
        #[arg(long)]
        timeslots: Option<PathBuf>,

        /// Analysis configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Validate input records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Record kind
        #[arg(long, value_enum)]
        kind: InputKind,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective analysis configuration as JSON
    Config {
        /// Configuration file to load and validate (defaults if omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an analysis configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a timeslots file
        #[arg(long)]
        timeslots: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputKind {
    Tapping,
    Wearable,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one payload per line)
    Ndjson,
    /// JSON array of payloads
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), MotorCliError> {
    match cli.command {
        Commands::Tapping {
            input,
            output,
            config,
            output_format,
        } => {
            let processor = MotorProcessor::new(load_config(config.as_deref())?)?;
            let payloads = processor.process_tapping(&read_input(&input)?)?;
            write_payloads(&output, &payloads, &output_format)
        }

        Commands::Wearable {
            input,
            output,
            timeslots,
            config,
            output_format,
        } => {
            let processor = MotorProcessor::new(load_config(config.as_deref())?)?;
            let timeslots = timeslots.as_deref().map(Timeslots::from_file).transpose()?;
            let payloads = processor.process_wearable(&read_input(&input)?, timeslots.as_ref())?;
            write_payloads(&output, &payloads, &output_format)
        }

        Commands::Validate { input, kind, json } => cmd_validate(&input, kind, json),

        Commands::Config { config } => {
            println!("{}", load_config(config.as_deref())?.to_json()?);
            Ok(())
        }

        Commands::Doctor {
            config,
            timeslots,
            json,
        } => cmd_doctor(config.as_deref(), timeslots.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, MotorCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, MotorCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_file(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn write_payloads(
    output: &Path,
    payloads: &[MotorPayload],
    format: &OutputFormat,
) -> Result<(), MotorCliError> {
    if payloads.is_empty() {
        return Err(MotorCliError::NoRecords);
    }
    let output_data = format_output(payloads, format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }
    Ok(())
}

fn cmd_validate(input: &Path, kind: InputKind, json: bool) -> Result<(), MotorCliError> {
    let input_data = read_input(input)?;

    let results: Vec<(String, Option<String>)> = match kind {
        InputKind::Tapping => RecordReader::parse_each::<TappingRecord>(&input_data)?
            .into_iter()
            .map(|entry| match entry {
                Ok(r) => (r.subject_id.clone(), r.validate().err().map(|e| e.to_string())),
                Err(rejected) => rejected_result(rejected),
            })
            .collect(),
        InputKind::Wearable => RecordReader::parse_each::<WearableRecord>(&input_data)?
            .into_iter()
            .map(|entry| match entry {
                Ok(r) => (r.subject_id.clone(), r.validate().err().map(|e| e.to_string())),
                Err(rejected) => rejected_result(rejected),
            })
            .collect(),
    };

    let total = results.len();
    let errors: Vec<ValidationErrorDetail> = results
        .into_iter()
        .enumerate()
        .filter_map(|(index, (subject_id, error))| {
            error.map(|error| ValidationErrorDetail {
                index,
                subject_id,
                error,
            })
        })
        .collect();
    let report = ValidationReport {
        total_records: total,
        valid_records: total - errors.len(),
        invalid_records: errors.len(),
        errors,
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
                println!("  - Record {} (index {}): {}", err.subject_id, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(MotorCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn rejected_result(rejected: RejectedRecord) -> (String, Option<String>) {
    let subject_id = rejected.subject_id.unwrap_or_else(|| "<unknown>".to_string());
    (subject_id, Some(rejected.error.to_string()))
}

fn cmd_doctor(config: Option<&Path>, timeslots: Option<&Path>, json: bool) -> Result<(), MotorCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "motor_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Motor version {}", MOTOR_VERSION),
        },
        DoctorCheck {
            name: "output_schema".to_string(),
            status: CheckStatus::Ok,
            message: format!("Output schema: {}", OUTPUT_SCHEMA_VERSION),
        },
        DoctorCheck {
            name: "threads".to_string(),
            status: CheckStatus::Ok,
            message: format!("Batch pool uses {} threads", rayon::current_num_threads()),
        },
    ];

    if let Some(path) = config {
        checks.push(file_check("config", path, |content| {
            AnalysisConfig::from_json(content).map(|c| {
                format!(
                    "Configuration valid ({} protocols, windows {:?} ms)",
                    c.protocols.len(),
                    c.windows_ms
                )
            })
        }));
    }

    if let Some(path) = timeslots {
        checks.push(file_check("timeslots", path, |content| {
            Timeslots::from_json(content).map(|t| format!("Timeslots valid ({} subjects)", t.len()))
        }));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass -i <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (-i - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: MOTOR_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Motor Doctor Report");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MotorCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn file_check(
    name: &str,
    path: &Path,
    parse: impl Fn(&str) -> Result<String, MotorError>,
) -> DoctorCheck {
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, format!("{} does not exist", path.display()))
    } else {
        match fs::read_to_string(path) {
            Ok(content) => match parse(&content) {
                Ok(summary) => (CheckStatus::Ok, summary),
                Err(e) => (CheckStatus::Error, e.to_string()),
            },
            Err(e) => (CheckStatus::Error, format!("Cannot read file: {}", e)),
        }
    };
    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

fn format_output(payloads: &[MotorPayload], format: &OutputFormat) -> Result<String, MotorCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for payload in payloads {
                lines.push(serde_json::to_string(payload)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(payloads)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(payloads)?),
    }
}

// Error handling

#[derive(Debug)]
enum MotorCliError {
    Io(io::Error),
    Motor(MotorError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for MotorCliError {
    fn from(e: io::Error) -> Self {
        MotorCliError::Io(e)
    }
}

impl From<MotorError> for MotorCliError {
    fn from(e: MotorError) -> Self {
        MotorCliError::Motor(e)
    }
}

impl From<serde_json::Error> for MotorCliError {
    fn from(e: serde_json::Error) -> Self {
        MotorCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MotorCliError> for CliError {
    fn from(e: MotorCliError) -> Self {
        match e {
            MotorCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MotorCliError::Motor(MotorError::Config(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'motor config' to see the default configuration".to_string()),
            },
            MotorCliError::Motor(e) => CliError {
                code: e.code().to_ascii_uppercase(),
                message: e.to_string(),
                hint: Some("Run 'motor validate' for per-record details".to_string()),
            },
            MotorCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MotorCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            MotorCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            MotorCliError::DoctorFailed => CliError {
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
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    subject_id: String,
    error: String,
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
