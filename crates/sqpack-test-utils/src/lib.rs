//! Test utilities for sqpack-rs
//!
//! Provides synthetic archive images for unit tests, temporary game
//! directory layouts for storage and CLI tests, and discovery of a real
//! game installation for tests that need shipped data.

mod image;

pub use image::{
    Block, DataImage, ENTRY_ALIGNMENT, HEADER_LENGTH, IndexImage, PAYLOAD_START, archive_header,
    chunked_blocks, encode_block, sample_archive,
};

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variable pointing at a game installation
pub const GAME_DIR_ENV: &str = "SQPACK_GAME_DIR";

/// Temporary game directory with the `game/sqpack` layout
#[derive(Debug)]
pub struct GameDir {
    dir: TempDir,
}

impl GameDir {
    /// Create an empty `game/sqpack` tree in a temporary directory
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("game").join("sqpack"))?;
        Ok(Self { dir })
    }

    /// Game directory root, the value users configure
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `game/sqpack` directory holding the archives
    pub fn sqpack_root(&self) -> PathBuf {
        self.dir.path().join("game").join("sqpack")
    }

    /// Write `<expansion>/<stem>.index` and one `<stem>.datN` per entry of `data`
    ///
    /// Returns the index path.
    pub fn add_archive(
        &self,
        expansion: &str,
        stem: &str,
        index: &[u8],
        data: &[&[u8]],
    ) -> std::io::Result<PathBuf> {
        let dir = self.sqpack_root().join(expansion);
        std::fs::create_dir_all(&dir)?;

        let index_path = dir.join(format!("{stem}.index"));
        std::fs::write(&index_path, index)?;
        for (id, bytes) in data.iter().enumerate() {
            std::fs::write(dir.join(format!("{stem}.dat{id}")), bytes)?;
        }
        Ok(index_path)
    }
}

/// Check if a path looks like a game installation
pub fn is_valid_game_dir(path: &Path) -> bool {
    path.join("game").join("sqpack").is_dir()
}

/// Get common installation paths
fn common_game_paths() -> Vec<PathBuf> {
    let bases: &[&str] = if cfg!(windows) {
        &[
            "C:\\Program Files (x86)\\SquareEnix\\FINAL FANTASY XIV - A Realm Reborn",
            "C:\\Program Files (x86)\\Steam\\steamapps\\common\\FINAL FANTASY XIV Online",
        ]
    } else if cfg!(target_os = "macos") {
        &["~/Library/Application Support/FINAL FANTASY XIV ONLINE/Bottles/published_Final_Fantasy/drive_c/Program Files (x86)/SquareEnix/FINAL FANTASY XIV - A Realm Reborn"]
    } else {
        &[
            "~/.steam/steam/steamapps/common/FINAL FANTASY XIV Online",
            "~/.local/share/Steam/steamapps/common/FINAL FANTASY XIV Online",
            "~/.xlcore/ffxiv",
        ]
    };

    bases
        .iter()
        .map(|base| PathBuf::from(shellexpand::tilde(base).to_string()))
        .collect()
}

/// Attempts to locate a game installation
pub fn find_game_data() -> Option<PathBuf> {
    // Strategy 1: Check environment variable
    if let Ok(path) = std::env::var(GAME_DIR_ENV) {
        let path = PathBuf::from(shellexpand::tilde(&path).to_string());
        if is_valid_game_dir(&path) {
            return Some(path);
        }
    }

    // Strategy 2: Check common installation paths
    common_game_paths()
        .into_iter()
        .find(|path| is_valid_game_dir(path))
}

/// Print instructions for pointing tests at a game installation
pub fn print_setup_instructions() {
    println!("Game Data Setup Instructions:");
    println!("============================");
    println!();
    println!("To run tests that read shipped archives, set:");
    println!();
    println!("  {GAME_DIR_ENV} = /path/to/game/installation");
    println!();
    println!("The directory must contain game/sqpack/ with *.index and *.dat* files.");
}

/// Get a game directory or skip the test with a helpful message
#[macro_export]
macro_rules! require_game_data {
    () => {
        match $crate::find_game_data() {
            Some(path) => path,
            None => {
                println!("Skipping test - no game data found");
                $crate::print_setup_instructions();
                return;
            }
        }
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_path_validation() {
        assert!(!is_valid_game_dir(&PathBuf::from("/nonexistent/path")));

        let temp_dir = tempfile::tempdir().unwrap();
        assert!(!is_valid_game_dir(temp_dir.path()));

        std::fs::create_dir_all(temp_dir.path().join("game/sqpack")).unwrap();
        assert!(is_valid_game_dir(temp_dir.path()));
    }

    #[test]
    fn test_game_dir_layout() {
        let game = GameDir::new().unwrap();
        assert!(is_valid_game_dir(game.path()));

        let (index, dat) = sample_archive(&[("exd/root.exl", b"root")]);
        let index_path = game
            .add_archive("ffxiv", "0a0000.win32", &index, &[&dat])
            .unwrap();

        assert!(index_path.ends_with("game/sqpack/ffxiv/0a0000.win32.index"));
        assert!(game.sqpack_root().join("ffxiv/0a0000.win32.dat0").is_file());
    }
}
