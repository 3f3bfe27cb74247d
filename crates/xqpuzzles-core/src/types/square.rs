//! マス（Square）
//!
//! 筋は a〜i（0〜8）、段は紅の一段目を 0 とする 0〜9。
//! FEN の行は上（黒側）から並ぶため `row()` で変換する。

/// 筋の数
pub const FILES: usize = 9;
/// 段の数
pub const RANKS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub const fn new(file: u8, rank: u8) -> Option<Square> {
        if (file as usize) < FILES && (rank as usize) < RANKS {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// 符号付きオフセットで生成（盤外なら None）
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if file < 0 || rank < 0 {
            return None;
        }
        Square::new(file as u8, rank as u8)
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.file
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// FEN 上の行番号（0 が黒の一段目）
    #[inline]
    pub const fn row(self) -> usize {
        RANKS - 1 - self.rank as usize
    }

    #[inline]
    pub const fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    /// 全マスを段→筋の順で列挙
    pub fn all() -> impl Iterator<Item = Square> {
        (0..RANKS as u8).flat_map(|rank| (0..FILES as u8).map(move |file| Square { file, rank }))
    }
}
