//! Sojourn CLI - Command-line interface for the mobility engine
//!
//! Commands:
//! - extract: Process a sample batch into daily feature records (batch mode)
//! - run: Process streaming samples from stdin (streaming mode)
//! - validate: Validate sample records against the input schema
//! - schema: Print schema information
//! - doctor: Diagnose engine health and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sojourn::encoder::FeatureEncoder;
use sojourn::pipeline::MobilityProcessor;
use sojourn::schema::{RecordAdapter, SampleRecord};
use sojourn::types::DailyFeatures;
use sojourn::{MobilityConfig, MobilityError, PRODUCER_NAME, SCHEMA_VERSION, SOJOURN_VERSION};

/// Sojourn - mobility feature extraction from GPS sample streams
#[derive(Parser)]
#[command(name = "sojourn")]
#[command(version = SOJOURN_VERSION)]
#[command(about = "Extract daily mobility features from geolocation samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a sample batch into daily feature records (batch mode)
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Parameter file (JSON MobilityConfig); defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load matrix history from file
        #[arg(long)]
        load_history: Option<PathBuf>,

        /// Save matrix history to file after processing
        #[arg(long)]
        save_history: Option<PathBuf>,
    },

    /// Process streaming samples from stdin, one JSON record per line
    Run {
        /// Output format for day records
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Parameter file (JSON MobilityConfig); defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load matrix history from file
        #[arg(long)]
        load_history: Option<PathBuf>,

        /// Save matrix history to file on exit
        #[arg(long)]
        save_history: Option<PathBuf>,

        /// Flush output after each completed day
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        flush: bool,
    },

    /// Validate sample records against the input schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
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

    /// Diagnose engine health and configuration
    Doctor {
        /// Check a matrix history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one day record per line)
    Ndjson,
    /// Feature report as JSON
    Json,
    /// Feature report as pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (mobility.sample.v1)
    Input,
    /// Output schema (mobility.features.v1)
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

fn run(cli: Cli) -> Result<(), SojournCliError> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            input_format,
            output_format,
            config,
            load_history,
            save_history,
        } => cmd_extract(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            load_history.as_deref(),
            save_history.as_deref(),
        ),

        Commands::Run {
            output_format,
            config,
            load_history,
            save_history,
            flush,
        } => cmd_run(
            output_format,
            config.as_deref(),
            load_history.as_deref(),
            save_history.as_deref(),
            flush,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),

        Commands::Doctor { history, json } => cmd_doctor(history.as_deref(), json),
    }
}

fn cmd_extract(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    load_history: Option<&Path>,
    save_history: Option<&Path>,
) -> Result<(), SojournCliError> {
    let input_data = read_input(input)?;

    let records = match input_format {
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RecordAdapter::parse_array(&input_data)?,
    };
    if records.is_empty() {
        return Err(SojournCliError::NoSamples);
    }

    let samples = RecordAdapter::to_samples(&records)?;
    let mut processor = MobilityProcessor::with_config(load_config(config)?);

    if let Some(history_path) = load_history {
        let history_json = fs::read_to_string(history_path)?;
        processor.load_history(&history_json)?;
    }

    let days = processor.process_window(&samples)?;

    if let Some(history_path) = save_history {
        fs::write(history_path, processor.save_history()?)?;
    }

    let output_data = format_output(&days, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    config: Option<&Path>,
    load_history: Option<&Path>,
    save_history: Option<&Path>,
    flush: bool,
) -> Result<(), SojournCliError> {
    let mut processor = MobilityProcessor::with_config(load_config(config)?);

    if let Some(history_path) = load_history {
        let history_json = fs::read_to_string(history_path)?;
        processor.load_history(&history_json)?;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut record_buffer: Vec<SampleRecord> = Vec::new();
    let mut current_date: Option<String> = None;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: SampleRecord = serde_json::from_str(trimmed)
            .map_err(|e| SojournCliError::Parse(format!("Failed to parse sample: {}", e)))?;
        let sample = record.to_sample()?;
        let sample_date = sample.timestamp.format("%Y-%m-%d").to_string();

        // A new calendar day closes out the buffered one.
        if let Some(ref date) = current_date {
            if &sample_date != date && !record_buffer.is_empty() {
                let output =
                    process_record_buffer(&mut processor, &record_buffer, &output_format)?;
                write!(stdout, "{}", output)?;
                if flush {
                    stdout.flush()?;
                }
                record_buffer.clear();
            }
        }

        current_date = Some(sample_date);
        record_buffer.push(record);
    }

    if !record_buffer.is_empty() {
        let output = process_record_buffer(&mut processor, &record_buffer, &output_format)?;
        write!(stdout, "{}", output)?;
        stdout.flush()?;
    }

    if let Some(history_path) = save_history {
        fs::write(history_path, processor.save_history()?)?;
    }

    Ok(())
}

fn process_record_buffer(
    processor: &mut MobilityProcessor,
    records: &[SampleRecord],
    output_format: &OutputFormat,
) -> Result<String, SojournCliError> {
    let samples = RecordAdapter::to_samples(records)?;
    let days = processor.process_window(&samples)?;
    format_output(&days, output_format)
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SojournCliError> {
    let input_data = read_input(input)?;

    let records = match input_format {
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RecordAdapter::parse_array(&input_data)?,
    };

    let failures = RecordAdapter::validate_records(&records);
    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - failures.len(),
        invalid_records: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                error: f.error.clone(),
            })
            .collect(),
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
                println!("  - Record {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(SojournCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), SojournCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SCHEMA_VERSION);
            println!();
            println!("One sample per record:");
            println!("  latitude   - degrees, -90 to 90");
            println!("  longitude  - degrees, -180 to 180");
            println!("  datetime   - integer milliseconds since the Unix epoch (UTC)");
            println!();
            println!("Records in a batch must be ordered non-decreasingly by datetime.");
            println!("Accepted as NDJSON (one record per line) or a JSON array.");
        }
        SchemaType::Output => {
            println!("Output Schema: mobility.features.v1");
            println!();
            println!("A feature report contains:");
            println!();
            println!("- report_version: Schema version");
            println!("- producer: {{ name, version, instance_id }}");
            println!("- computed_at_utc: RFC 3339 timestamp");
            println!("- days: Array of daily records containing:");
            println!("  - date, number_of_places, home_stay, total_distance");
            println!("  - location_variance, entropy, normalized_entropy");
            println!("  - routine_index, hour_matrix (24 rows x P places)");
            println!();
            println!("Sentinels: home_stay and routine_index are -1 when undefined;");
            println!("entropy and normalized_entropy are 0 for a single place.");
        }
    }

    Ok(())
}

fn cmd_doctor(history: Option<&Path>, json: bool) -> Result<(), SojournCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Sojourn version {}", SOJOURN_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(history_path) = history {
        if history_path.exists() {
            match fs::read_to_string(history_path) {
                Ok(content) => match sojourn::MatrixHistory::from_json(&content) {
                    Ok(loaded) => {
                        checks.push(DoctorCheck {
                            name: "history".to_string(),
                            status: CheckStatus::Ok,
                            message: format!(
                                "History file valid ({} days of matrices)",
                                loaded.day_count()
                            ),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "history".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid history JSON: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "history".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read history file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "history".to_string(),
                status: CheckStatus::Warning,
                message: "History file does not exist".to_string(),
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
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SOJOURN_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sojourn Doctor Report");
        println!("=====================");
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
        Err(SojournCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, SojournCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<MobilityConfig, SojournCliError> {
    let config = match path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => MobilityConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn format_output(
    days: &[DailyFeatures],
    format: &OutputFormat,
) -> Result<String, SojournCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for day in days {
                lines.push(serde_json::to_string(day)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => {
            Ok(FeatureEncoder::new().encode_to_json(days.to_vec())?)
        }
        OutputFormat::JsonPretty => {
            let report = FeatureEncoder::new().encode(days.to_vec());
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}

// Error types

#[derive(Debug)]
enum SojournCliError {
    Io(io::Error),
    Engine(MobilityError),
    Json(serde_json::Error),
    NoSamples,
    ValidationFailed(usize),
    DoctorFailed,
    Parse(String),
}

impl From<io::Error> for SojournCliError {
    fn from(e: io::Error) -> Self {
        SojournCliError::Io(e)
    }
}

impl From<MobilityError> for SojournCliError {
    fn from(e: MobilityError) -> Self {
        SojournCliError::Engine(e)
    }
}

impl From<serde_json::Error> for SojournCliError {
    fn from(e: serde_json::Error) -> Self {
        SojournCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SojournCliError> for CliError {
    fn from(e: SojournCliError) -> Self {
        match e {
            SojournCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SojournCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure samples are ordered and coordinates valid".to_string()),
            },
            SojournCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SojournCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SojournCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            SojournCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            SojournCliError::Parse(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
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
