//! 台本どおりの評価値を返すシェル製エンジンで、走査から CSV 出力までを通す
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tools::export::{DEFAULT_EDITOR_URL, PuzzleSink};
use tools::scanner::{PuzzleScanner, ScanPolicy, Theme};
use xqpuzzles_core::{Color, Score};
use xqpuzzles_uci::{EngineConfig, EngineKind, start_engine};

const GAME: [&str; 12] = [
    "h3e3", "h8e8", "h1g3", "h10g8", "i1h1", "i10h10", "b1c3", "b10c8", "a1b1", "a10b10", "g4g5",
    "g7g6",
];

/// 手番側から見た評価値。紅視点では +50 が続いた後、ply 10 から +500。
const RELATIVE_SCORES: &str = "50 -50 50 -50 50 -50 500 -500 500";

fn write_engine(dir: &Path) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
set -- {RELATIVE_SCORES}
while read -r line; do
  case "$line" in
    uci)
      echo "id name ScriptedFish"
      echo "uciok"
      ;;
    isready) echo "readyok" ;;
    go*)
      echo "info depth 1 score cp $1"
      echo "bestmove (none)"
      shift
      ;;
    quit) exit 0 ;;
  esac
done
"#
    );
    let path = dir.join("scripted-engine");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn scanner_reports_swing_through_real_subprocess() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        kind: EngineKind::Pikafish,
        path: Some(write_engine(dir.path())),
        depth: Some(1),
        movetime_ms: None,
        ..EngineConfig::default()
    };
    let mut engine = start_engine(&config).unwrap();

    let puzzles = PuzzleScanner::new(engine.as_mut(), ScanPolicy::default())
        .skip_initial(4)
        .scan(&GAME)
        .unwrap();
    engine.quit();

    assert_eq!(puzzles.len(), 1);
    assert_eq!(puzzles[0].ply, 10);
    assert_eq!(puzzles[0].first_turn, Color::Red);
    assert_eq!(puzzles[0].score, Score::Cp(500));
    assert_eq!(puzzles[0].theme, Theme::Capturing);

    let out = dir.path().join("puzzles.csv");
    let mut sink = PuzzleSink::open(&out, DEFAULT_EDITOR_URL).unwrap();
    sink.write(Some("demo"), &puzzles).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().nth(1).unwrap().starts_with("demo,"));
}

#[test]
fn puzzle_maker_binary_writes_csv() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path());
    let out = dir.path().join("output.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_puzzle_maker"))
        .arg("--moves")
        .arg(GAME.join(","))
        .arg("--engine")
        .arg("pikafish")
        .arg("--engine-path")
        .arg(&engine)
        .arg("--skip-initial")
        .arg("4")
        .arg("--depth")
        .arg("1")
        .arg("--out")
        .arg(&out)
        .arg("--quiet")
        .status()
        .unwrap();
    assert!(status.success());

    let text = fs::read_to_string(&out).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].contains(",CAPTURING,+500,RED,"));
}
