//! SqPack command-line front end
//!
//! This library holds the subcommand definitions and handlers for the
//! `sqpack` binary.

pub mod commands;
pub mod output;

use clap::Args;
use sqpack_storage::ConfigManager;
use std::path::PathBuf;

/// Output format options for the CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON output
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

impl OutputFormat {
    /// Whether the format is one of the JSON variants
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    /// Render `value` as JSON in this format's layout
    pub fn to_json<T: serde::Serialize>(self, value: &T) -> serde_json::Result<String> {
        if matches!(self, Self::JsonPretty) {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// Context for command execution
#[derive(Clone, Debug)]
pub struct CommandContext {
    /// Output format
    pub format: OutputFormat,
    /// Config file given with `--config`
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Load settings from `--config` or the default location
    pub fn config(&self) -> sqpack_storage::Result<ConfigManager> {
        match &self.config_path {
            Some(path) => ConfigManager::with_path(path),
            None => ConfigManager::new(),
        }
    }
}

/// Arguments of `extract`
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// File to extract, as `archive:folder/file` or `folder/file`
    pub path: String,

    /// Game installation directory; remembered for later runs
    #[arg(short, long)]
    pub game: Option<PathBuf>,

    /// Directory the file is written under
    #[arg(long, default_value = ".")]
    pub output: PathBuf,
}

/// Arguments of `hash`
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Path to hash, as `folder/file`
    pub path: String,
}

/// Arguments of `guess`
#[derive(Args, Debug)]
pub struct GuessArgs {
    /// Target hash as 8 hex digits, optionally prefixed with `0x`
    pub hash: String,

    /// Longest name to try, not counting prefix and suffix
    #[arg(short, long, default_value_t = 6)]
    pub max_length: usize,

    /// Literal text before every candidate
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Literal text after every candidate
    #[arg(short, long, default_value = "")]
    pub suffix: String,
}

/// Arguments of `archives`
#[derive(Args, Debug)]
pub struct ArchivesArgs {
    /// Game installation directory; remembered for later runs
    #[arg(short, long)]
    pub game: Option<PathBuf>,

    /// Only list indexes of this archive
    #[arg(short, long)]
    pub archive: Option<String>,
}
