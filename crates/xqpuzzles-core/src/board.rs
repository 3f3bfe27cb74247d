//! 盤面アダプタ
//!
//! 指し手スタックと現在局面（FEN）を保持し、合法性判定・局面計算・表記変換は
//! `MoveGenerator` に委譲する。スタックは内部では常に UCI 方言で持ち、エンジン側の
//! 方言への変換は入出力の境界で行う。

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::dialect::{self, Dialect};
use crate::error::BoardError;
use crate::fen::{self, FenGrid};
use crate::rules::{MoveGenerator, XiangqiRules};
use crate::types::{Color, RANKS};

/// 象棋の初期局面
pub const XIANGQI_START_FEN: &str =
    "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

/// 指し手生成器に渡すバリアント名
pub const DEFAULT_VARIANT: &str = "xiangqi";

/// 終局状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// 手番側が詰んでいる
    Mate,
    /// 手番側に合法手がない（王手ではない）
    Stalemate,
    /// 双方とも駒不足
    Draw,
}

#[derive(Clone)]
pub struct Board {
    generator: Arc<dyn MoveGenerator>,
    variant: String,
    /// エンジン側の方言
    dialect: Dialect,
    root_fen: String,
    fen: String,
    /// UCI 方言の指し手列
    stack: Vec<String>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("variant", &self.variant)
            .field("dialect", &self.dialect)
            .field("root_fen", &self.root_fen)
            .field("fen", &self.fen)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl Board {
    /// 初期局面・組み込みルールで作る
    pub fn new(dialect: Dialect) -> Board {
        Board::with_generator(Arc::new(XiangqiRules::new()), dialect)
    }

    /// 任意の指し手生成器で初期局面から作る
    pub fn with_generator(generator: Arc<dyn MoveGenerator>, dialect: Dialect) -> Board {
        Board {
            generator,
            variant: DEFAULT_VARIANT.to_string(),
            dialect,
            root_fen: XIANGQI_START_FEN.to_string(),
            fen: XIANGQI_START_FEN.to_string(),
            stack: Vec::new(),
        }
    }

    /// 任意の局面から作る。FEN の盤面は検証する。
    pub fn from_fen(
        generator: Arc<dyn MoveGenerator>,
        fen: &str,
        dialect: Dialect,
    ) -> Result<Board, BoardError> {
        FenGrid::parse(fen)?;
        let mut board = Board::with_generator(generator, dialect);
        board.root_fen = fen.to_string();
        board.fen = fen.to_string();
        Ok(board)
    }

    /// 指し手列をまとめて適用する。失敗時は盤面を一切変更しない。
    pub fn push<S: AsRef<str>>(&mut self, moves: &[S], dialect: Dialect) -> Result<(), BoardError> {
        let converted = moves
            .iter()
            .map(|mv| dialect::convert(mv.as_ref(), dialect, Dialect::Uci))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| BoardError::InvalidMove {
                moves: moves.iter().map(|m| m.as_ref().to_string()).collect(),
                reason: err.to_string(),
            })?;
        let fen = self
            .generator
            .compute_position(&self.variant, &self.fen, &converted)
            .inspect_err(|err| debug!("push rejected at {}: {err}", self.fen))?;
        self.stack.extend(converted);
        self.fen = fen;
        Ok(())
    }

    /// 独立したスタックを持つ複製。指し手生成器は共有する。
    pub fn copy(&self) -> Board {
        self.clone()
    }

    /// エンジン方言に変換した指し手列
    pub fn stack(&self) -> Vec<String> {
        self.stack
            .iter()
            .map(|mv| dialect::convert(mv, Dialect::Uci, self.dialect).unwrap_or_else(|_| mv.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn root_fen(&self) -> &str {
        &self.root_fen
    }

    pub fn turn(&self) -> Color {
        fen::side_to_move(&self.fen)
    }

    /// 大駒の枚数差
    pub fn material_balance(&self) -> u32 {
        fen::material_balance(&self.fen)
    }

    /// 指し手の移動先にある駒（指す前）
    pub fn captured_piece_at(&self, mv: &str, dialect: Dialect) -> Result<Option<char>, BoardError> {
        let (_, to) = dialect.parse_move(mv)?;
        Ok(FenGrid::parse(&self.fen)?.at(to))
    }

    /// 表示用の表記
    pub fn notation(&self, mv: &str, dialect: Dialect) -> Result<String, BoardError> {
        let uci = dialect::convert(mv, dialect, Dialect::Uci)?;
        self.generator.to_notation(&self.variant, &self.fen, &uci)
    }

    /// エンジン方言の合法手
    pub fn legal_moves(&self) -> Result<Vec<String>, BoardError> {
        self.generator
            .legal_moves(&self.variant, &self.fen)?
            .iter()
            .map(|mv| dialect::convert(mv, Dialect::Uci, self.dialect))
            .collect()
    }

    pub fn is_checked(&self) -> Result<bool, BoardError> {
        self.generator.is_in_check(&self.variant, &self.fen)
    }

    /// (紅, 黒) の駒不足
    pub fn insufficient_material(&self) -> Result<(bool, bool), BoardError> {
        self.generator
            .has_insufficient_material(&self.variant, &self.fen)
    }

    /// 終局していればその種類
    pub fn game_status(&self) -> Result<Option<GameStatus>, BoardError> {
        let (red, black) = self.insufficient_material()?;
        if red && black {
            return Ok(Some(GameStatus::Draw));
        }
        if !self.legal_moves()?.is_empty() {
            return Ok(None);
        }
        if self.is_checked()? {
            Ok(Some(GameStatus::Mate))
        } else {
            Ok(Some(GameStatus::Stalemate))
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = match FenGrid::parse(&self.fen) {
            Ok(grid) => grid,
            Err(_) => return write!(f, "{}", self.fen),
        };
        for (row_idx, row) in grid.rows().iter().enumerate() {
            // 行 0 が最上段（黒側）
            let label = (RANKS - 1 - row_idx) as u8 + self.dialect.rank_origin();
            write!(f, "{label:>2} ")?;
            for cell in row {
                write!(f, " {}", cell.unwrap_or('.'))?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for file in 'a'..='i' {
            write!(f, " {file}")?;
        }
        writeln!(f)?;
        write!(f, "{} to move", self.turn().label())
    }
}
