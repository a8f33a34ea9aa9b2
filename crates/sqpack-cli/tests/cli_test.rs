//! Integration tests for the sqpack CLI

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use assert_cmd::Command;
use predicates::prelude::*;
use sqpack_test_utils::{GameDir, sample_archive};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ROOT_EXL: &[u8] = b"EXLT,2\nAchievement,209\n";

/// Config file in a scratch directory, with the index cache kept beside it
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        fs::write(
            dir.path().join("config.toml"),
            format!("cache_dir = '{}'\n", cache.display()),
        )
        .unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn cache(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn sqpack(&self) -> Command {
        let mut cmd = Command::cargo_bin("sqpack").unwrap();
        cmd.env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config());
        cmd
    }
}

fn sample_game() -> GameDir {
    let game = GameDir::new().unwrap();
    let (index, dat0) = sample_archive(&[
        ("exd/root.exl", ROOT_EXL),
        ("chara/equipment/e0001/model.mdl", &[3u8; 20_000][..]),
    ]);
    game.add_archive("ffxiv", "0a0000.win32", &index, &[dat0.as_slice()])
        .unwrap();
    game
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("sqpack").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("hash"))
        .stdout(predicate::str::contains("guess"))
        .stdout(predicate::str::contains("archives"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("sqpack").unwrap();
    cmd.arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_hash_command() {
    let ws = Workspace::new();
    ws.sqpack()
        .args(["hash", "EXD/Root.exl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("folder: e39b7999"))
        .stdout(predicate::str::contains("file: 51b57ebc"));
}

#[test]
fn test_hash_json() {
    let ws = Workspace::new();
    ws.sqpack()
        .args(["--format", "json", "hash", "exd/root.exl"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""folder":"e39b7999""#))
        .stdout(predicate::str::contains(r#""file":"51b57ebc""#));
}

#[test]
fn test_guess_finds_name() {
    let ws = Workspace::new();
    ws.sqpack()
        .args(["guess", "cadbbe3d", "--max-length", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abc"));
}

#[test]
fn test_guess_with_affixes() {
    let ws = Workspace::new();
    // 51b57ebc is the hash of "root.exl"
    ws.sqpack()
        .args(["guess", "0x51B57EBC", "-m", "4", "--suffix", ".exl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("root.exl"));
}

#[test]
fn test_guess_exhausted() {
    let ws = Workspace::new();
    ws.sqpack()
        .args(["guess", "cadbbe3d", "--max-length", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No preimage of cadbbe3d"));
}

#[test]
fn test_guess_rejects_bad_hash() {
    let ws = Workspace::new();
    ws.sqpack()
        .args(["guess", "xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid hash"));
}

#[test]
fn test_extract_requires_game() {
    let ws = Workspace::new();
    ws.sqpack()
        .args(["extract", "0a0000:exd/root.exl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Please specify game location using --game option.",
        ));
}

#[test]
fn test_extract_writes_file_and_remembers_game() {
    let ws = Workspace::new();
    let game = sample_game();
    let output = ws.output();

    ws.sqpack()
        .args(["extract", "0a0000:exd/root.exl", "--game"])
        .arg(game.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("root.exl"));

    let written = output.join("exd").join("root.exl");
    assert_eq!(fs::read(&written).unwrap(), ROOT_EXL);

    let config = fs::read_to_string(ws.config()).unwrap();
    assert!(config.contains(arg(game.path())));
    assert!(config.contains("cache_dir"));

    let cached: Vec<_> = fs::read_dir(ws.cache()).unwrap().collect();
    assert_eq!(cached.len(), 1);

    // The stored game directory is used when --game is omitted
    let second = ws.dir.path().join("second");
    ws.sqpack()
        .args(["extract", "chara/equipment/e0001/model.mdl", "--output"])
        .arg(&second)
        .assert()
        .success();
    let model = fs::read(second.join("chara/equipment/e0001/model.mdl")).unwrap();
    assert_eq!(model, vec![3u8; 20_000]);
}

#[test]
fn test_extract_missing_file() {
    let ws = Workspace::new();
    let game = sample_game();

    ws.sqpack()
        .args(["extract", "0a0000:exd/missing.exh", "--game"])
        .arg(game.path())
        .arg("--output")
        .arg(ws.output())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Can not find file \"0a0000:exd/missing.exh\".",
        ));

    assert!(!ws.output().exists());
}

#[test]
fn test_extract_unknown_archive() {
    let ws = Workspace::new();
    let game = sample_game();

    ws.sqpack()
        .args(["extract", "040000:chara/model.mdl", "--game"])
        .arg(game.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("040000"));
}

#[test]
fn test_archives_json() {
    let ws = Workspace::new();
    let game = sample_game();

    ws.sqpack()
        .args(["--format", "json", "archives", "--game"])
        .arg(game.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""archive":"0a0000""#))
        .stdout(predicate::str::contains(r#""index":"ffxiv/0a0000.win32.index""#))
        .stdout(predicate::str::contains(r#""files":2"#));
}

#[test]
fn test_archives_table() {
    let ws = Workspace::new();
    let game = sample_game();

    ws.sqpack()
        .args(["archives", "--game"])
        .arg(game.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Archive"))
        .stdout(predicate::str::contains("0a0000"));
}
