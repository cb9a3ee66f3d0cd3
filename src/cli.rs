use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "simpair")]
#[command(about = "Find the two most similar files in a directory tree")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress spinners and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. info, simpair=trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the two most similar files under a directory
    Find(FindArgs),

    /// Initialize a simpair.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct FindArgs {
    /// Root directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Initial histogram size bound (top N words per file, or "auto")
    #[arg(long, value_name = "N|auto")]
    pub compare_len: Option<String>,

    /// Worker threads for histogram building and scoring
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Histogram growth factor between passes (2..=6)
    #[arg(long)]
    pub scale_factor: Option<usize>,

    /// Additional glob patterns to ignore
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Honour .gitignore and .ignore files
    #[arg(long)]
    pub gitignore: bool,

    /// Include hidden files
    #[arg(long, action = clap::ArgAction::Set, value_name = "BOOL")]
    pub hidden: Option<bool>,

    /// Maximum depth to traverse
    #[arg(short, long)]
    pub max_depth: Option<usize>,

    /// Print a summary table of every pass
    #[arg(long)]
    pub passes: bool,

    /// Emit the result as a single JSON line
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
