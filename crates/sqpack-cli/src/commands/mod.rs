//! Subcommand handlers

pub mod archives;
pub mod extract;
pub mod guess;
pub mod hash;

use crate::CommandContext;
use anyhow::{Context, bail};
use sqpack_storage::{JsonIndexCache, Repository};
use std::path::PathBuf;
use tracing::debug;

/// Open the configured installation, remembering `game` when given
///
/// The index cache lives in the configured cache directory.
pub fn open_repository(ctx: &CommandContext, game: Option<PathBuf>) -> anyhow::Result<Repository> {
    let mut config = ctx.config()?;

    if let Some(game) = game {
        config.config_mut().set_game_dir(game);
        config
            .save()
            .with_context(|| format!("Failed to save config to {}", config.path().display()))?;
        debug!("Saved game directory to {:?}", config.path());
    }

    let Some(game_dir) = config.config().game_dir() else {
        bail!("Please specify game location using --game option.");
    };

    let cache = JsonIndexCache::new(config.config().cache_dir());
    Ok(Repository::open(game_dir, Box::new(cache))?)
}
