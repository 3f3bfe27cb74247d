//! 評価値（Score）
//!
//! エンジンの `score cp`/`score mate` は探索局面の手番視点で届く。
//! [`PovScore`] で手番を添えて保持し、外へ出すときは紅視点の [`Score`] に揃える。

use std::fmt;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

use super::Color;

/// 評価値。センチポーンか詰み手数（手数は ply、符号は勝ち側）のどちらか一方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

impl Score {
    #[inline]
    pub const fn is_mate(self) -> bool {
        matches!(self, Score::Mate(_))
    }

    /// 詰み手数（センチポーンなら None）
    #[inline]
    pub const fn mate(self) -> Option<i32> {
        match self {
            Score::Mate(n) => Some(n),
            Score::Cp(_) => None,
        }
    }

    /// センチポーン値（詰みなら None）
    #[inline]
    pub const fn cp(self) -> Option<i32> {
        match self {
            Score::Cp(v) => Some(v),
            Score::Mate(_) => None,
        }
    }

    /// 紅視点の値を `color` 視点に直す
    #[inline]
    pub fn pov(self, color: Color) -> Score {
        match color {
            Color::Red => self,
            Color::Black => -self,
        }
    }
}

impl Neg for Score {
    type Output = Score;

    fn neg(self) -> Score {
        match self {
            Score::Cp(v) => Score::Cp(-v),
            Score::Mate(n) => Score::Mate(-n),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(v) => write!(f, "{v:+}"),
            Score::Mate(n) => write!(f, "#{n:+}"),
        }
    }
}

/// aspiration window 未解決時の境界フラグ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    #[default]
    Exact,
    Lower,
    Upper,
}

/// 探索局面の手番から見た評価値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PovScore {
    pub relative: Score,
    pub turn: Color,
}

impl PovScore {
    pub const fn new(relative: Score, turn: Color) -> PovScore {
        PovScore { relative, turn }
    }

    /// 紅視点
    pub fn red(self) -> Score {
        self.pov(Color::Red)
    }

    /// `color` 視点
    pub fn pov(self, color: Color) -> Score {
        if self.turn == color {
            self.relative
        } else {
            -self.relative
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_variants_are_exclusive() {
        for score in [Score::Cp(0), Score::Cp(-35), Score::Mate(3), Score::Mate(-1)] {
            assert_ne!(score.is_mate(), score.cp().is_some());
            assert_eq!(score.is_mate(), score.mate().is_some());
        }
    }

    #[test]
    fn test_pov_score_flips_for_black() {
        let pov = PovScore::new(Score::Cp(120), Color::Black);
        assert_eq!(pov.red(), Score::Cp(-120));
        assert_eq!(pov.pov(Color::Black), Score::Cp(120));

        let mate = PovScore::new(Score::Mate(5), Color::Red);
        assert_eq!(mate.pov(Color::Black), Score::Mate(-5));
        assert_eq!(Score::Mate(-5).pov(Color::Black), Score::Mate(5));
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::Cp(50).to_string(), "+50");
        assert_eq!(Score::Cp(-7).to_string(), "-7");
        assert_eq!(Score::Mate(3).to_string(), "#+3");
        assert_eq!(Score::Mate(-2).to_string(), "#-2");
    }
}
