use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

mod logging;

#[derive(Parser, Debug)]
#[command(name = "drdat")]
#[command(version)]
#[command(
    about = "Decoder for DrDat quantized multi-dimensional data files.",
    long_about = None,
    after_help = "Examples:\n  drdat decode sample.drdat -o report.json\n  drdat decode sample.drdat --stdout --pretty\n  drdat describe sample.drdat"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a DrDat file and write a versioned JSON report.
    #[command(alias = "read")]
    Decode {
        /// Path to a .drdat file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// List variable descriptors without decoding samples.
    #[command(alias = "inspect")]
    Describe {
        /// Path to a .drdat file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            input,
            report,
            stdout,
            pretty,
            compact,
            quiet,
        } => cmd_decode(input, report, stdout, pretty, compact, quiet),
        Commands::Describe { input } => cmd_describe(input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<drdat_core::FileError> for CliError {
    fn from(err: drdat_core::FileError) -> Self {
        let hint = match &err {
            drdat_core::FileError::Decode(drdat_core::DecodeError::InvalidHeader { .. }) => {
                Some("the file does not start with the DrDat validator byte (69)".to_string())
            }
            drdat_core::FileError::Decode(drdat_core::DecodeError::TruncatedInput { .. }) => {
                Some("the file is shorter than its header declares; it may be incomplete".to_string())
            }
            _ => None,
        };
        CliError::new(format!("DrDat decoding failed: {err}"), hint)
    }
}

fn cmd_decode(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    validate_input_file(&input)?;
    let input_abs = fs::canonicalize(&input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        let report_dir = report_path
            .parent()
            .map(|parent| {
                if parent.as_os_str().is_empty() {
                    fs::canonicalize(".")
                } else {
                    fs::canonicalize(parent)
                }
            })
            .transpose()
            .ok()
            .flatten();
        if let Some(report_dir) = report_dir {
            let report_target = report_dir.join(
                report_path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
            );
            if report_target == input_abs {
                return Err(CliError::new(
                    format!(
                        "report path must differ from input: {}",
                        report_path.display()
                    ),
                    Some("choose a different output path".to_string()),
                ));
            }
        }
    }

    let rep = drdat_core::decode_dat_file(&input)?;
    let json = serialize_report(&rep, pretty, compact)?;

    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;
    debug!(report = %report.display(), "report written");

    if !quiet {
        eprintln!(
            "OK: {} variable(s) decoded -> {}",
            rep.variables.len(),
            report.display()
        );
    }
    Ok(())
}

fn cmd_describe(input: PathBuf) -> Result<(), CliError> {
    validate_input_file(&input)?;
    let descriptors = drdat_core::describe_dat_file(&input)?;

    println!("{}: {} variable(s)", input.display(), descriptors.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        let dims = descriptor
            .dimensions
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x");
        println!(
            "  [{}] bits={} dims={} samples={} scale={} offset={}",
            index,
            descriptor.bit_width.bits(),
            if dims.is_empty() { "-" } else { dims.as_str() },
            descriptor.sample_count(),
            descriptor.scale,
            descriptor.offset
        );
    }
    Ok(())
}

fn serialize_report(
    rep: &drdat_core::Report,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .drdat file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .drdat file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "drdat" && ext != "dat" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .drdat or .dat file".to_string()),
        ));
    }
    Ok(())
}
