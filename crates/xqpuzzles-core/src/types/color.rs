//! 手番（Color）

/// 手番（紅/黒）。紅が先手。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    /// 手番の数
    pub const NUM: usize = 2;

    /// 相手番を返す
    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// インデックスとして使用（配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 紅視点の値をこの手番視点に直すための符号
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Color::Red => 1,
            Color::Black => -1,
        }
    }

    /// FEN の手番フィールドから変換（`w`/`r` が紅、`b` が黒）
    pub fn from_fen_field(field: &str) -> Option<Color> {
        match field {
            "w" | "r" => Some(Color::Red),
            "b" => Some(Color::Black),
            _ => None,
        }
    }

    /// FEN の手番フィールド
    pub const fn fen_field(self) -> &'static str {
        match self {
            Color::Red => "w",
            Color::Black => "b",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Black => "BLACK",
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.opponent()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::Red.opponent(), Color::Black);
        assert_eq!(!Color::Black, Color::Red);
    }

    #[test]
    fn test_color_fen_field() {
        assert_eq!(Color::from_fen_field("w"), Some(Color::Red));
        assert_eq!(Color::from_fen_field("r"), Some(Color::Red));
        assert_eq!(Color::from_fen_field("b"), Some(Color::Black));
        assert_eq!(Color::from_fen_field("x"), None);
        assert_eq!(Color::Black.fen_field(), "b");
    }
}
