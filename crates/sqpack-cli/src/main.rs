use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sqpack_cli::{
    ArchivesArgs, CommandContext, ExtractArgs, GuessArgs, HashArgs, OutputFormat, commands,
};

#[derive(Parser)]
#[command(
    name = "sqpack",
    about = "Extract files from SqPack game archives",
    version,
    long_about = "A command-line tool for reading SqPack archives: extracts files by path, \
                  computes the folder and file hashes used by the indexes, and recovers \
                  short names from a known hash."
)]
struct Cli {
    /// Set the logging level (overridden by RUST_LOG)
    #[arg(short, long, value_enum, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SQPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const fn directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one file to disk
    Extract(ExtractArgs),

    /// Print the folder and file hashes of a path
    Hash(HashArgs),

    /// Search for a short name matching a hash
    Guess(GuessArgs),

    /// List the indexes of the game installation
    Archives(ArchivesArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = CommandContext {
        format: cli.format,
        config_path: cli.config,
    };

    match cli.command {
        Commands::Extract(args) => commands::extract::handle(args, &ctx)?,
        Commands::Hash(args) => commands::hash::handle(args, &ctx)?,
        Commands::Guess(args) => commands::guess::handle(args, &ctx)?,
        Commands::Archives(args) => commands::archives::handle(args, &ctx)?,
    }

    Ok(())
}
