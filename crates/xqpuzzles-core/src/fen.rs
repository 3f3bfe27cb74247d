//! FEN 文字列の軽量な読み取り
//!
//! 盤面フィールドを 10x9 の文字グリッドに展開するだけで、合法性は検証しない。
//! 駒得判定や取られる駒の参照など、指し手生成器を呼ぶまでもない用途に使う。

use crate::error::BoardError;
use crate::types::{Color, Square, FILES, RANKS};

/// 盤面フィールドを展開したグリッド。行 0 が黒側（FEN の先頭行）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenGrid {
    rows: [[Option<char>; FILES]; RANKS],
}

impl FenGrid {
    pub fn parse(fen: &str) -> Result<FenGrid, BoardError> {
        let board = board_field(fen);
        let mut rows = [[None; FILES]; RANKS];
        let mut row_count = 0;
        for (row_idx, row) in board.split('/').enumerate() {
            if row_idx >= RANKS {
                return Err(BoardError::invalid_fen(fen, "too many rows"));
            }
            let mut file = 0usize;
            for ch in row.chars() {
                if let Some(n) = ch.to_digit(10) {
                    file += n as usize;
                } else if ch == '+' {
                    continue;
                } else {
                    if file >= FILES {
                        return Err(BoardError::invalid_fen(fen, format!("row {row_idx} overflows")));
                    }
                    rows[row_idx][file] = Some(ch);
                    file += 1;
                }
            }
            if file != FILES {
                return Err(BoardError::invalid_fen(fen, format!("row {row_idx} has {file} files")));
            }
            row_count += 1;
        }
        if row_count != RANKS {
            return Err(BoardError::invalid_fen(fen, format!("expected {RANKS} rows")));
        }
        Ok(FenGrid { rows })
    }

    /// マス上の駒文字
    pub fn at(&self, sq: Square) -> Option<char> {
        self.rows[sq.row()][sq.file() as usize]
    }

    /// 行単位の参照（行 0 が黒側）
    pub fn rows(&self) -> &[[Option<char>; FILES]; RANKS] {
        &self.rows
    }
}

/// FEN の盤面フィールド
pub fn board_field(fen: &str) -> &str {
    let board = fen.split_whitespace().next().unwrap_or("");
    // 持ち駒表記 `[...]` は象棋では使わないが、付いていれば切り落とす
    board.split('[').next().unwrap_or(board)
}

/// FEN の手番。フィールドが無ければ紅。
pub fn side_to_move(fen: &str) -> Color {
    fen.split_whitespace()
        .nth(1)
        .and_then(Color::from_fen_field)
        .unwrap_or(Color::Red)
}

/// 大駒（車・砲・馬）の枚数差。盤面フィールドだけを数える安価な静的指標。
pub fn material_balance(fen: &str) -> u32 {
    let mut red = 0i32;
    let mut black = 0i32;
    for piece in board_field(fen).chars() {
        match piece {
            'r' | 'c' | 'n' | 'h' => black += 1,
            'R' | 'C' | 'N' | 'H' => red += 1,
            _ => {}
        }
    }
    (red - black).unsigned_abs()
}
