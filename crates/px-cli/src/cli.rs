//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "px-cli",
    version,
    about = "Build, translate and validate PX statistical tables",
    long_about = "Build multi-language PX-files from microdata or aggregated tables,\n\
                  export PX-web classification artifacts, exchange texts with\n\
                  translators and cross-check tables against reference data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a PX-file from a CSV table and a TOML build configuration.
    Build(BuildArgs),

    /// Run a TOML validation plan against tables in a data directory.
    Validate(ValidateArgs),

    /// Export classification rows as PX-web .vs/.agg artifacts.
    Classify(ClassifyArgs),

    /// Exchange document texts with translators.
    #[command(subcommand)]
    Translate(TranslateCommand),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// CSV input: microdata, or one row per cell when the config names a value column.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Build configuration (TOML).
    #[arg(long = "config", short = 'c', value_name = "TOML")]
    pub config: PathBuf,

    /// PX-file to write. Classification artifacts go to the same directory.
    #[arg(long = "output", short = 'o', value_name = "PX")]
    pub output: PathBuf,

    /// Set CREATION-DATE to the current local time.
    #[arg(long = "stamp")]
    pub stamp: bool,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Validation plan (TOML).
    #[arg(value_name = "PLAN")]
    pub plan: PathBuf,

    /// Directory holding `<dataset>.csv` tables (default: the plan's directory).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    /// Report failures without a failing exit status.
    #[arg(long = "advisory")]
    pub advisory: bool,

    /// Write one CSV per check with every joined row and its percent change.
    #[arg(long = "report-dir", value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Classification rows (CSV with valuecode, valuetext and aggregation columns).
    #[arg(value_name = "ROWS")]
    pub rows: PathBuf,

    /// Classification name; names the artifacts (default: file stem).
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Presentation text shown by PX-web (default: the name).
    #[arg(long = "presentation-text")]
    pub presentation_text: Option<String>,

    /// Domain referenced by PX-files (default: the name).
    #[arg(long = "domain")]
    pub domain: Option<String>,

    /// Directory for the artifacts.
    #[arg(long = "output-dir", short = 'o', value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum TranslateCommand {
    /// Write a PX-file's texts to a translation CSV.
    Export(TranslateExportArgs),

    /// Rebuild a PX-file from a translated CSV and a data table.
    Import(TranslateImportArgs),
}

#[derive(Parser)]
pub struct TranslateExportArgs {
    #[arg(value_name = "PX")]
    pub px: PathBuf,

    #[arg(long = "output", short = 'o', value_name = "CSV")]
    pub output: PathBuf,

    /// Include data cells for reference (ignored on import).
    #[arg(long = "with-data")]
    pub with_data: bool,
}

#[derive(Parser)]
pub struct TranslateImportArgs {
    /// Translated CSV.
    #[arg(value_name = "SHEET")]
    pub sheet: PathBuf,

    /// Table with one row per cell.
    #[arg(long = "data", value_name = "CSV")]
    pub data: PathBuf,

    /// Value column of the data table.
    #[arg(long = "value-column", default_value = "value")]
    pub value_column: String,

    /// Classification rows for bound domains; the file stem is the domain.
    #[arg(long = "classification", value_name = "CSV")]
    pub classifications: Vec<PathBuf>,

    #[arg(long = "output", short = 'o', value_name = "PX")]
    pub output: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
