//! 指し手座標の方言（UCI / UCCI）
//!
//! - UCI: 段を 1 始まりで数える（`h3e3`、`a10a9`）。Fairy-Stockfish 系。
//! - UCCI: 段を 0 始まりで数える（`h2e2`、`a9a8`）。Pikafish 系。
//!
//! 方言は指し手ではなくエンジンの属性として扱う。

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::types::Square;

static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-i])(\d{1,2})([a-i])(\d{1,2})$").expect("static move pattern")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Uci,
    Ucci,
}

impl Dialect {
    /// 一段目の数字
    #[inline]
    pub const fn rank_origin(self) -> u8 {
        match self {
            Dialect::Uci => 1,
            Dialect::Ucci => 0,
        }
    }

    /// 1マス分の座標文字列
    pub fn format_square(self, sq: Square) -> String {
        format!("{}{}", sq.file_char(), sq.rank() + self.rank_origin())
    }

    /// 指し手を組み立てる
    pub fn format_move(self, from: Square, to: Square) -> String {
        format!("{}{}", self.format_square(from), self.format_square(to))
    }

    /// 指し手を (移動元, 移動先) に分解する
    pub fn parse_move(self, mv: &str) -> Result<(Square, Square), BoardError> {
        let caps = MOVE_RE
            .captures(mv)
            .ok_or_else(|| BoardError::InvalidCoordinate(mv.to_string()))?;
        let square = |file: &str, rank: &str| -> Option<Square> {
            let file = file.as_bytes()[0] - b'a';
            let rank: u8 = rank.parse().ok()?;
            let rank = rank.checked_sub(self.rank_origin())?;
            Square::new(file, rank)
        };
        let from = square(&caps[1], &caps[2]);
        let to = square(&caps[3], &caps[4]);
        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(BoardError::InvalidCoordinate(mv.to_string())),
        }
    }
}

/// 指し手の方言を変換する
pub fn convert(mv: &str, from: Dialect, to: Dialect) -> Result<String, BoardError> {
    if from == to {
        // 形式チェックだけは行う
        from.parse_move(mv)?;
        return Ok(mv.to_string());
    }
    let (src, dst) = from.parse_move(mv)?;
    Ok(to.format_move(src, dst))
}

/// `h3e3` → `h2e2`
pub fn uci_to_ucci(mv: &str) -> Result<String, BoardError> {
    convert(mv, Dialect::Uci, Dialect::Ucci)
}

/// `h2e2` → `h3e3`
pub fn ucci_to_uci(mv: &str) -> Result<String, BoardError> {
    convert(mv, Dialect::Ucci, Dialect::Uci)
}

/// 指し手らしいトークンか（info 行の pv 判定用）
pub fn looks_like_move(token: &str) -> bool {
    MOVE_RE.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uci_ucci_round_trip() {
        let moves = ["h3e3", "a10a9", "b1c3", "i4i5", "e1e2", "h10g8"];
        for mv in moves {
            let ucci = uci_to_ucci(mv).unwrap();
            assert_eq!(ucci_to_uci(&ucci).unwrap(), mv);
            // 変換後の方言から往復しても同一
            assert_eq!(uci_to_ucci(&ucci_to_uci(&ucci).unwrap()).unwrap(), ucci);
        }
        assert_eq!(uci_to_ucci("a10a9").unwrap(), "a9a8");
        assert_eq!(ucci_to_uci("h2e2").unwrap(), "h3e3");
    }

    #[test]
    fn test_every_square_pair_round_trips() {
        for from in Square::all() {
            let to = Square::new(8 - from.file(), 9 - from.rank()).unwrap();
            let ucci = Dialect::Ucci.format_move(from, to);
            let uci = ucci_to_uci(&ucci).unwrap();
            assert_eq!(uci_to_ucci(&uci).unwrap(), ucci);
            assert_eq!(Dialect::Uci.parse_move(&uci).unwrap(), (from, to));
        }
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        assert!(uci_to_ucci("a0a1").is_err());
        assert!(uci_to_ucci("a11a1").is_err());
        assert!(ucci_to_uci("a10a9").is_err());
        assert!(ucci_to_uci("j1j2").is_err());
        assert!(ucci_to_uci("e2").is_err());
        assert!(!looks_like_move("cp"));
        assert!(looks_like_move("h2e2"));
    }
}
