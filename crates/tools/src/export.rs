//! 候補局面の CSV 出力

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use xqpuzzles_core::fen::board_field;

use crate::scanner::PuzzleCandidate;

/// 盤面エディタの URL。盤面フィールドを末尾に付ける。
pub const DEFAULT_EDITOR_URL: &str = "https://xiangqi-dev.arbisoft.com/editor/";

pub const PUZZLE_HEADER: [&str; 8] = [
    "game_id",
    "fen",
    "moves_count",
    "theme",
    "score",
    "first_turn",
    "pv",
    "url",
];

#[derive(Debug, Serialize)]
struct PuzzleRow<'a> {
    game_id: &'a str,
    fen: &'a str,
    moves_count: usize,
    theme: &'static str,
    score: String,
    first_turn: &'static str,
    pv: String,
    url: String,
}

/// 候補局面を CSV に追記する
pub struct PuzzleSink {
    writer: csv::Writer<File>,
    editor_url: String,
    path: PathBuf,
    written: usize,
}

impl PuzzleSink {
    /// ファイルが無ければヘッダ付きで作り、あれば末尾に追記する
    pub fn open(path: &Path, editor_url: &str) -> Result<PuzzleSink> {
        let exists = path.is_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if !exists {
            writer.write_record(PUZZLE_HEADER)?;
            writer.flush()?;
        }
        Ok(PuzzleSink {
            writer,
            editor_url: editor_url.to_string(),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn url_for(&self, fen: &str) -> String {
        format!("{}{}", self.editor_url, board_field(fen))
    }

    /// 1 局分の候補を書き込む。`game_id` が無ければ空欄。
    pub fn write(&mut self, game_id: Option<&str>, puzzles: &[PuzzleCandidate]) -> Result<()> {
        for puzzle in puzzles {
            self.writer.serialize(PuzzleRow {
                game_id: game_id.unwrap_or(""),
                fen: &puzzle.fen,
                moves_count: puzzle.moves_count,
                theme: puzzle.theme.as_str(),
                score: puzzle.score.to_string(),
                first_turn: puzzle.first_turn.label(),
                pv: puzzle.pv.join(" "),
                url: self.url_for(&puzzle.fen),
            })?;
            self.written += 1;
        }
        self.writer
            .flush()
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
