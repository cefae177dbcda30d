// risktab CLI - headless log normalization and risk scoring

mod exit_codes;
mod ingest;
mod normalize;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "rtab")]
#[command(about = "Normalize heterogeneous security logs into a canonical risk table")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a log or scanner CSV into the canonical risk-scored schema
    #[command(after_help = "\
Examples:
  rtab normalize events.csv
  rtab normalize events.csv -o normalized.csv --preview 5
  cat events.csv | rtab normalize - --json")]
    Normalize {
        /// Input CSV file ('-' for stdin)
        input: PathBuf,

        /// Write the canonical table to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Emit canonical records as JSON instead of CSV
        #[arg(long)]
        json: bool,

        /// Print the first N normalized rows to stderr
        #[arg(long, value_name = "N")]
        preview: Option<usize>,
    },

    /// Legacy alias-based ingest with additive severity scoring
    #[command(after_help = "\
Examples:
  rtab ingest scan.csv -o normalized.csv
  rtab ingest scan.csv --mapping aliases.toml")]
    Ingest {
        /// Input CSV file ('-' for stdin)
        input: PathBuf,

        /// Write the ingested table to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// TOML file with extra [aliases] raw-name -> canonical-name entries
        #[arg(long)]
        mapping: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Load a raw table from a file path or stdin (`-`).
fn load_table(input: &PathBuf) -> Result<risktab_engine::RawTable, CliError> {
    let table = if input.as_os_str() == "-" {
        use std::io::Read;
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::io(format!("cannot read stdin: {e}")))?;
        let delimiter = risktab_io::csv::sniff_delimiter(&content);
        risktab_io::csv::import_from_string(&content, delimiter).map_err(CliError::parse)?
    } else {
        risktab_io::csv::import(input)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", input.display())))?
    };
    log::debug!("loaded {} rows, {} columns", table.row_count(), table.columns().len());
    Ok(table)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize { input, output, json, preview } => {
            normalize::cmd_normalize(input, output, json, preview)
        }
        Commands::Ingest { input, output, mapping } => {
            ingest::cmd_ingest(input, output, mapping)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}
