//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KGCFP - Build a knowledge graph of Chinese figure painting from historical texts.
#[derive(Debug, Parser)]
#[command(name = "kgcfp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Graph database file
    #[arg(long, env = "KGCFP_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts or ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract entities from Markdown documents into JSON result files
    Extract(ExtractArgs),

    /// Import extraction results into the graph
    Import(ImportArgs),

    /// Show node and relationship counts
    Stats,

    /// Find nodes whose id or properties contain a string
    Search(SearchArgs),

    /// Delete every node and relationship
    Clear(ClearArgs),
}

/// Extraction presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// One attempt per chunk, short timeout
    Fast,
    /// Keep short sections, retry harder
    Thorough,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Markdown file or directory of Markdown files
    pub input: PathBuf,

    /// Directory for the result files
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Model name
    #[arg(short, long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Use a preset instead of the configured extractor settings
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// Directory holding `*_extracted.json` files
    #[arg(default_value = "output")]
    pub input: PathBuf,

    /// Clear the graph before importing
    #[arg(long)]
    pub clear: bool,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Text to look for
    pub query: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for the clear command.
#[derive(Debug, Parser)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PresetArg> for kgcfp_extractor::ExtractorConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Fast => kgcfp_extractor::ExtractorConfig::fast(),
            PresetArg::Thorough => kgcfp_extractor::ExtractorConfig::thorough(),
        }
    }
}
