use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

/// scriptloom - long-form script generation with a rotating key pool
#[derive(Parser, Debug)]
#[command(name = "scriptloom")]
#[command(version)]
#[command(about = "Outline, hook and chapter generation with an automation queue", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.scriptloom/scriptloom.json)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive; RUST_LOG takes precedence
    #[arg(long = "log-level", global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long = "log-format", global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage API keys
    #[command(subcommand)]
    Keys(KeysCommand),

    /// Manage the job queue and the library
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Generate one script right away, outside the queue
    Generate(ScriptArgs),

    /// Run the automation queue until it is drained or stopped
    Run(RunArgs),

    /// Print or save a finished script
    Export(ExportArgs),

    /// Manage thumbnail style profiles
    #[command(subcommand)]
    Styles(StylesCommand),

    /// Generate a 16:9 thumbnail image
    Thumbnail(ThumbnailArgs),
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Add a key from a literal value, a file, or an environment variable
    Add {
        /// Key value
        value: Option<String>,

        /// Read the key from this file
        #[arg(long = "file", conflicts_with = "value")]
        file: Option<String>,

        /// Read the key from this environment variable
        #[arg(long = "env", conflicts_with_all = ["value", "file"])]
        env: Option<String>,
    },

    /// Remove a key by its position in `keys list` (1-based)
    Remove { index: usize },

    /// List keys in rotation order (masked)
    List,

    /// Print a fresh key for encrypting stored API keys
    GenerateEncryptionKey,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// Queue a script for automation
    Add(ScriptArgs),

    /// List every job in queue order
    List {
        #[arg(long = "json")]
        json: bool,
    },

    /// Show one job
    Show {
        job_id: String,
        #[arg(long = "json")]
        json: bool,
    },

    /// Reset a job to PENDING
    Retry { job_id: String },

    /// Delete a job
    Delete { job_id: String },

    /// Archive a finished script, or restore an archived one
    Archive { job_id: String },

    /// List finished scripts, newest first
    Library {
        /// Show archived scripts instead of available ones
        #[arg(long = "archived")]
        archived: bool,
    },
}

#[derive(Args, Debug)]
pub struct ScriptArgs {
    #[arg(long = "title")]
    pub title: String,

    #[arg(long = "concept")]
    pub concept: String,

    /// Target video length in minutes
    #[arg(long = "duration", value_name = "MINUTES", default_value_t = 20)]
    pub duration: u32,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Do not print progress events
    #[arg(long = "quiet")]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    pub job_id: String,

    #[arg(long = "part", value_enum, default_value_t = ExportPartArg::Full)]
    pub part: ExportPartArg,

    /// Write to this file instead of stdout
    #[arg(long = "out")]
    pub out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPartArg {
    /// Hook and every chapter
    Full,
    /// Hook and chapter 1
    Hook,
    /// Chapters 2 onwards
    Rest,
}

#[derive(Subcommand, Debug)]
pub enum StylesCommand {
    List,

    /// Add or replace a style
    Add {
        name: String,

        /// Master prompt prepended to every scene
        #[arg(long = "prompt")]
        prompt: String,

        /// JSON file with the style analysis
        #[arg(long = "analysis-file")]
        analysis_file: Option<PathBuf>,
    },

    Remove { name: String },
}

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Scene description
    pub prompt: String,

    /// Saved style to apply
    #[arg(long = "style")]
    pub style: Option<String>,

    #[arg(long = "out")]
    pub out: PathBuf,
}
