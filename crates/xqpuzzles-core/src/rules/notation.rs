//! WXF 形式の棋譜表記
//!
//! 駒文字・元の筋・方向（`+` 前進 / `-` 後退 / `=` 横）・移動先の筋または距離の 4 文字。
//! 筋は指す側から見て右から 1..9 と数える。同じ筋に同種の駒が並ぶ場合は筋番号の代わりに
//! `+`（前）/ `-`（後）を使う。

use super::position::{Position, RawMove};
use crate::types::{Color, PieceKind, Square};

/// 指す側から見た筋番号 (1..=9)
fn file_number(sq: Square, color: Color) -> u8 {
    match color {
        Color::Red => 9 - sq.file(),
        Color::Black => sq.file() + 1,
    }
}

/// 指す側から見た前方への段差
fn forward_distance(from: Square, to: Square, color: Color) -> i32 {
    (to.rank() as i32 - from.rank() as i32) * color.sign()
}

/// 元の位置の表記。同じ筋の同種の駒が 2 枚以上あれば前後で区別する。
fn origin_marker(pos: &Position, from: Square, kind: PieceKind, color: Color) -> char {
    let mut same_file: Vec<Square> = pos
        .pieces(color)
        .filter(|(sq, piece)| piece.kind == kind && sq.file() == from.file())
        .map(|(sq, _)| sq)
        .collect();
    if same_file.len() >= 2 {
        // 前方にある順
        same_file.sort_by_key(|sq| -(sq.rank() as i32) * color.sign());
        if same_file.first() == Some(&from) {
            return '+';
        }
        if same_file.last() == Some(&from) {
            return '-';
        }
    }
    char::from(b'0' + file_number(from, color))
}

pub(crate) fn wxf(pos: &Position, (from, to): RawMove) -> Option<String> {
    let piece = pos.piece_at(from)?;
    let color = piece.color;
    let forward = forward_distance(from, to, color);
    let direction = match forward {
        d if d > 0 => '+',
        d if d < 0 => '-',
        _ => '=',
    };
    let diagonal = matches!(
        piece.kind,
        PieceKind::Advisor | PieceKind::Elephant | PieceKind::Horse
    );
    let target = if diagonal || forward == 0 {
        file_number(to, color) as u32
    } else {
        forward.unsigned_abs()
    };

    let mut out = String::with_capacity(4);
    out.push(piece.kind.wxf_letter());
    out.push(origin_marker(pos, from, piece.kind, color));
    out.push(direction);
    out.push_str(&target.to_string());
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::XIANGQI_START_FEN;

    fn sq(file: u8, rank: u8) -> Square {
        Square::new(file, rank).unwrap()
    }

    #[test]
    fn test_opening_moves() {
        let pos = Position::from_fen(XIANGQI_START_FEN).unwrap();
        // 中炮: h3-e3
        assert_eq!(wxf(&pos, (sq(7, 2), sq(4, 2))).as_deref(), Some("C2=5"));
        // 馬 h1-g3
        assert_eq!(wxf(&pos, (sq(7, 0), sq(6, 2))).as_deref(), Some("H2+3"));
        // 車 a1-a2
        assert_eq!(wxf(&pos, (sq(0, 0), sq(0, 1))).as_deref(), Some("R9+1"));
    }

    #[test]
    fn test_black_numbers_files_from_its_right() {
        let pos = Position::from_fen(
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C2C4/9/RNBAKABNR b - - 1 1",
        )
        .unwrap();
        // 黒の砲 h8-e8
        assert_eq!(wxf(&pos, (sq(7, 7), sq(4, 7))).as_deref(), Some("C8=5"));
        // 黒の卒 c7-c6
        assert_eq!(wxf(&pos, (sq(2, 6), sq(2, 5))).as_deref(), Some("P3+1"));
    }

    #[test]
    fn test_tandem_pieces_use_front_and_rear() {
        // a1 と a3 に紅の車
        let tandem = Position::from_fen("4k4/9/9/9/9/9/9/R8/9/R2K5 w - - 0 1").unwrap();
        assert_eq!(wxf(&tandem, (sq(0, 2), sq(0, 4))).as_deref(), Some("R++2"));
        assert_eq!(wxf(&tandem, (sq(0, 0), sq(1, 0))).as_deref(), Some("R-=8"));
    }
}
