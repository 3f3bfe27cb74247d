//! 組み込みルール用の内部局面表現と疑似合法手生成

use crate::dialect::Dialect;
use crate::error::BoardError;
use crate::fen::FenGrid;
use crate::types::{Color, Piece, PieceKind, Square, FILES, RANKS};

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
/// 馬の移動先と、それを塞ぐ脚の位置
const HORSE_JUMPS: [((i8, i8), (i8, i8)); 8] = [
    ((1, 2), (0, 1)),
    ((-1, 2), (0, 1)),
    ((1, -2), (0, -1)),
    ((-1, -2), (0, -1)),
    ((2, 1), (1, 0)),
    ((2, -1), (1, 0)),
    ((-2, 1), (-1, 0)),
    ((-2, -1), (-1, 0)),
];

pub(crate) type RawMove = (Square, Square);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Position {
    /// `[段][筋]`、段 0 が紅の一段目
    cells: [[Option<Piece>; FILES]; RANKS],
    side: Color,
    halfmove: u32,
    fullmove: u32,
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Position, BoardError> {
        let grid = FenGrid::parse(fen)?;
        let mut cells = [[None; FILES]; RANKS];
        for sq in Square::all() {
            if let Some(ch) = grid.at(sq) {
                let piece = Piece::from_char(ch)
                    .ok_or_else(|| BoardError::invalid_fen(fen, format!("unknown piece '{ch}'")))?;
                cells[sq.rank() as usize][sq.file() as usize] = Some(piece);
            }
        }

        let mut fields = fen.split_whitespace().skip(1);
        let side = match fields.next() {
            Some(field) => Color::from_fen_field(field)
                .ok_or_else(|| BoardError::invalid_fen(fen, format!("bad side to move '{field}'")))?,
            None => Color::Red,
        };
        // castling / en passant は象棋では常に '-'
        let mut counters = fields.skip(2);
        let halfmove = counters.next().and_then(|v| v.parse().ok()).unwrap_or(0);
        let fullmove = counters.next().and_then(|v| v.parse().ok()).unwrap_or(1);

        let pos = Position {
            cells,
            side,
            halfmove,
            fullmove,
        };
        for color in [Color::Red, Color::Black] {
            if pos.king_square(color).is_none() {
                return Err(BoardError::invalid_fen(fen, format!("{color} king is missing")));
            }
        }
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut board = String::with_capacity(96);
        for rank in (0..RANKS).rev() {
            let mut empty = 0;
            for file in 0..FILES {
                match self.cells[rank][file] {
                    Some(piece) => {
                        if empty > 0 {
                            board.push_str(&empty.to_string());
                            empty = 0;
                        }
                        board.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                board.push_str(&empty.to_string());
            }
            if rank > 0 {
                board.push('/');
            }
        }
        format!(
            "{} {} - - {} {}",
            board,
            self.side.fen_field(),
            self.halfmove,
            self.fullmove
        )
    }

    #[inline]
    pub fn side(&self) -> Color {
        self.side
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.rank() as usize][sq.file() as usize]
    }

    fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.rank() as usize][sq.file() as usize] = piece;
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::all().find(|&sq| self.piece_at(sq) == Some(Piece::new(PieceKind::King, color)))
    }

    /// 指定色の駒の一覧
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| match self.piece_at(sq) {
            Some(piece) if piece.color == color => Some((sq, piece)),
            _ => None,
        })
    }

    /// 指し手を適用し、取った駒を返す
    pub fn apply(&mut self, (from, to): RawMove) -> Option<Piece> {
        let moving = self.piece_at(from);
        let captured = self.piece_at(to);
        self.set(to, moving);
        self.set(from, None);
        if captured.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if self.side == Color::Black {
            self.fullmove += 1;
        }
        self.side = !self.side;
        captured
    }

    /// 王同士が同じ筋で間に駒なく向き合っているか（飛将）
    fn kings_facing(&self) -> bool {
        let (Some(red), Some(black)) = (self.king_square(Color::Red), self.king_square(Color::Black))
        else {
            return false;
        };
        if red.file() != black.file() {
            return false;
        }
        (red.rank() + 1..black.rank())
            .filter_map(|rank| Square::new(red.file(), rank))
            .all(|sq| self.piece_at(sq).is_none())
    }

    /// `color` の王が取られる状態か
    pub fn in_check(&self, color: Color) -> bool {
        let Some(king) = self.king_square(color) else {
            return true;
        };
        if self.kings_facing() {
            return true;
        }
        self.pseudo_moves(!color).iter().any(|&(_, to)| to == king)
    }

    /// 手番側の合法手
    pub fn legal_moves(&self) -> Vec<RawMove> {
        let side = self.side;
        self.pseudo_moves(side)
            .into_iter()
            .filter(|&mv| {
                let mut next = self.clone();
                next.apply(mv);
                !next.in_check(side)
            })
            .collect()
    }

    pub fn is_legal(&self, mv: RawMove) -> bool {
        self.legal_moves().contains(&mv)
    }

    pub fn legal_moves_in(&self, dialect: Dialect) -> Vec<String> {
        self.legal_moves()
            .into_iter()
            .map(|(from, to)| dialect.format_move(from, to))
            .collect()
    }

    /// 王手放置を考慮しない疑似合法手
    pub fn pseudo_moves(&self, color: Color) -> Vec<RawMove> {
        let mut moves = Vec::with_capacity(64);
        for (from, piece) in self.pieces(color) {
            match piece.kind {
                PieceKind::King => self.step_moves(from, color, &ORTHOGONAL, in_palace, &mut moves),
                PieceKind::Advisor => self.step_moves(from, color, &DIAGONAL, in_palace, &mut moves),
                PieceKind::Elephant => self.elephant_moves(from, color, &mut moves),
                PieceKind::Horse => self.horse_moves(from, color, &mut moves),
                PieceKind::Rook => self.rook_moves(from, color, &mut moves),
                PieceKind::Cannon => self.cannon_moves(from, color, &mut moves),
                PieceKind::Pawn => self.pawn_moves(from, color, &mut moves),
            }
        }
        moves
    }

    fn can_land(&self, sq: Square, color: Color) -> bool {
        self.piece_at(sq).is_none_or(|p| p.color != color)
    }

    fn step_moves(
        &self,
        from: Square,
        color: Color,
        dirs: &[(i8, i8)],
        allowed: fn(Square, Color) -> bool,
        moves: &mut Vec<RawMove>,
    ) {
        for &(df, dr) in dirs {
            if let Some(to) = from.offset(df, dr) {
                if allowed(to, color) && self.can_land(to, color) {
                    moves.push((from, to));
                }
            }
        }
    }

    fn elephant_moves(&self, from: Square, color: Color, moves: &mut Vec<RawMove>) {
        for &(df, dr) in &DIAGONAL {
            let (Some(eye), Some(to)) = (from.offset(df, dr), from.offset(2 * df, 2 * dr)) else {
                continue;
            };
            if self.piece_at(eye).is_none() && own_half(to, color) && self.can_land(to, color) {
                moves.push((from, to));
            }
        }
    }

    fn horse_moves(&self, from: Square, color: Color, moves: &mut Vec<RawMove>) {
        for &((df, dr), (lf, lr)) in &HORSE_JUMPS {
            let (Some(leg), Some(to)) = (from.offset(lf, lr), from.offset(df, dr)) else {
                continue;
            };
            if self.piece_at(leg).is_none() && self.can_land(to, color) {
                moves.push((from, to));
            }
        }
    }

    fn rook_moves(&self, from: Square, color: Color, moves: &mut Vec<RawMove>) {
        for &(df, dr) in &ORTHOGONAL {
            let mut cur = from;
            while let Some(to) = cur.offset(df, dr) {
                match self.piece_at(to) {
                    None => moves.push((from, to)),
                    Some(p) => {
                        if p.color != color {
                            moves.push((from, to));
                        }
                        break;
                    }
                }
                cur = to;
            }
        }
    }

    fn cannon_moves(&self, from: Square, color: Color, moves: &mut Vec<RawMove>) {
        for &(df, dr) in &ORTHOGONAL {
            let mut cur = from;
            let mut screened = false;
            while let Some(to) = cur.offset(df, dr) {
                match (self.piece_at(to), screened) {
                    (None, false) => moves.push((from, to)),
                    (None, true) => {}
                    (Some(_), false) => screened = true,
                    (Some(p), true) => {
                        if p.color != color {
                            moves.push((from, to));
                        }
                        break;
                    }
                }
                cur = to;
            }
        }
    }

    fn pawn_moves(&self, from: Square, color: Color, moves: &mut Vec<RawMove>) {
        let forward = color.sign() as i8;
        if let Some(to) = from.offset(0, forward) {
            if self.can_land(to, color) {
                moves.push((from, to));
            }
        }
        if !own_half(from, color) {
            for df in [-1, 1] {
                if let Some(to) = from.offset(df, 0) {
                    if self.can_land(to, color) {
                        moves.push((from, to));
                    }
                }
            }
        }
    }
}

/// 九宮内か
fn in_palace(sq: Square, color: Color) -> bool {
    let file_ok = (3..=5).contains(&sq.file());
    let rank_ok = match color {
        Color::Red => sq.rank() <= 2,
        Color::Black => sq.rank() >= 7,
    };
    file_ok && rank_ok
}

/// 河を渡っていないか
fn own_half(sq: Square, color: Color) -> bool {
    match color {
        Color::Red => sq.rank() <= 4,
        Color::Black => sq.rank() >= 5,
    }
}
