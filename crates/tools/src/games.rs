//! 対局記録 CSV の読み書き
//!
//! 列は `id,rplayer,bplayer,moves_count,moves`。`moves` は `['h3e3', 'h8e8']` のような
//! リスト表記か、カンマ／空白区切りの並び。書き出しはリスト表記で行う。

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use xqpuzzles_core::dialect::looks_like_move;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("static separator pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: String,
    pub rplayer: String,
    pub bplayer: String,
    pub moves_count: u32,
    /// UCI 方言
    pub moves: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GameRow {
    id: String,
    rplayer: String,
    bplayer: String,
    moves_count: u32,
    moves: String,
}

/// 指し手リストの文字列を分解する
pub fn parse_moves(raw: &str) -> Result<Vec<String>> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let mut moves = Vec::new();
    for token in SEPARATOR_RE.split(inner) {
        let token = token.trim_matches(|c| c == '\'' || c == '"');
        if token.is_empty() {
            continue;
        }
        if !looks_like_move(token) {
            bail!("'{token}' is not a coordinate move");
        }
        moves.push(token.to_string());
    }
    Ok(moves)
}

/// リスト表記に戻す
pub fn format_moves(moves: &[String]) -> String {
    let quoted: Vec<String> = moves.iter().map(|m| format!("'{m}'")).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn load_games(path: &Path) -> Result<Vec<GameRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut games = Vec::new();
    for (line, row) in reader.deserialize::<GameRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), line + 2))?;
        let moves = parse_moves(&row.moves)
            .with_context(|| format!("{}: game {} has bad moves", path.display(), row.id))?;
        games.push(GameRecord {
            id: row.id,
            rplayer: row.rplayer,
            bplayer: row.bplayer,
            moves_count: row.moves_count,
            moves,
        });
    }
    Ok(games)
}

pub fn write_games(path: &Path, games: &[GameRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    if games.is_empty() {
        writer.write_record(["id", "rplayer", "bplayer", "moves_count", "moves"])?;
    }
    for game in games {
        writer.serialize(GameRow {
            id: game.id.clone(),
            rplayer: game.rplayer.clone(),
            bplayer: game.bplayer.clone(),
            moves_count: game.moves_count,
            moves: format_moves(&game.moves),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_moves_accepts_list_literals() {
        let expected = vec!["h3e3".to_string(), "h10g8".to_string()];
        assert_eq!(parse_moves("['h3e3', 'h10g8']").unwrap(), expected);
        assert_eq!(parse_moves("[\"h3e3\",\"h10g8\"]").unwrap(), expected);
        assert_eq!(parse_moves("h3e3,h10g8").unwrap(), expected);
        assert_eq!(parse_moves(" h3e3  h10g8 ").unwrap(), expected);
        assert!(parse_moves("[]").unwrap().is_empty());
        assert!(parse_moves("['h3e3', 'xx']").is_err());
    }

    #[test]
    fn test_write_then_load_games() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("games.csv");
        let games = vec![GameRecord {
            id: "1001".to_string(),
            rplayer: "alice".to_string(),
            bplayer: "bob".to_string(),
            moves_count: 2,
            moves: vec!["h3e3".to_string(), "h8e8".to_string()],
        }];
        write_games(&path, &games).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,rplayer,bplayer,moves_count,moves\n"));
        assert!(text.contains("\"['h3e3', 'h8e8']\""));
        assert_eq!(load_games(&path).unwrap(), games);
    }

    #[test]
    fn test_load_reports_bad_moves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,rplayer,bplayer,moves_count,moves\n7,a,b,1,zz\n").unwrap();
        let err = load_games(&path).unwrap_err();
        assert!(format!("{err:#}").contains("game 7"));
    }
}
