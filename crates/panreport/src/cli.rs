//! Clap derive structures for the `panreport` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use panreport_core::{ExportKind, ExportMode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// panreport -- reports and exports from PAN-OS firewalls
#[derive(Debug, Parser)]
#[command(
    name = "panreport",
    version,
    about = "Generate and export PAN-OS firewall reports",
    long_about = "Fetches configuration and log reports from a PAN-OS management API\n\
        and exports them as CSV or PDF. Settings (URL, API key, export\n\
        preferences) are stored encrypted; see `panreport config`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PANREPORT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Directory for exported reports (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Settings file (overrides config)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Export file format.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Pdf,
}

impl From<FormatArg> for ExportKind {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ExportKind::Tabular,
            FormatArg::Pdf => ExportKind::Document,
        }
    }
}

/// Column selection for CSV exports.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Columns from the first entry
    Standard,
    /// Union of columns over all entries
    Complete,
}

impl From<ModeArg> for ExportMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Standard => ExportMode::Standard,
            ModeArg::Complete => ExportMode::Complete,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage connection settings and app configuration
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// List available report types
    #[command(alias = "ls")]
    Types(TypesArgs),

    /// Probe the firewall API with the stored settings
    Test,

    /// Fetch a report and optionally export it
    #[command(alias = "gen", alias = "g")]
    Generate(GenerateArgs),

    /// Fetch and export several reports concurrently
    Batch(BatchArgs),

    /// Fetch reports and search them for a term
    Search(SearchArgs),

    /// Fetch a report and filter it by field values
    Filter(FilterArgs),

    /// Inspect or delete exported report files
    Reports(ReportsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show app config and connection settings (API key redacted)
    Show,

    /// Print config and settings file paths
    Path,

    /// Write the effective app configuration to config.toml
    Init,

    /// Update connection settings
    Set(ConfigSetArgs),
}

#[derive(Debug, Args)]
pub struct ConfigSetArgs {
    /// Firewall management URL, e.g. https://fw01.example.net
    #[arg(long)]
    pub url: Option<String>,

    /// API key (prompted without echo when `--url` is given without it)
    #[arg(long, env = "PANREPORT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Row cap for CSV exports
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// CSV column selection
    #[arg(long, value_enum)]
    pub format: Option<ModeArg>,
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TypesArgs {
    /// Only list one category (e.g. "Policies", "Logs")
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Start of the log window (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of the log window (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Report type, e.g. securityRules
    pub report_type: String,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Export the fetched report
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub export: Option<FormatArg>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Report types to fetch and export
    #[arg(required = true)]
    pub report_types: Vec<String>,

    /// Export format
    #[arg(long, short = 'f', value_enum, default_value = "csv")]
    pub format: FormatArg,

    #[command(flatten)]
    pub range: RangeArgs,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive search term
    pub term: String,

    /// Report types to fetch before searching
    #[arg(long, short = 'r', value_delimiter = ',', required = true)]
    pub reports: Vec<String>,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Report type to fetch and filter
    pub report_type: String,

    /// Field filter as FIELD=VALUE (repeatable, all must match)
    #[arg(long = "where", short = 'w', value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Export the filtered entries
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub export: Option<FormatArg>,
}

// ── Artifacts ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// List exported files, newest first
    List,

    /// Export history with inferred report types
    History,

    /// Delete an exported file
    Delete {
        /// Path of the file inside the reports directory
        path: PathBuf,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}
