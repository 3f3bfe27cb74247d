//! 組み込みの象棋ルール実装

use super::MoveGenerator;
use super::notation;
use super::position::Position;
use crate::board::DEFAULT_VARIANT;
use crate::dialect::Dialect;
use crate::error::BoardError;
use crate::types::Color;

/// 外部ライブラリなしで動く `MoveGenerator`。対応バリアントは `xiangqi` のみ。
#[derive(Debug, Clone, Copy, Default)]
pub struct XiangqiRules;

impl XiangqiRules {
    pub fn new() -> XiangqiRules {
        XiangqiRules
    }

    fn position(&self, variant: &str, fen: &str) -> Result<Position, BoardError> {
        if variant != DEFAULT_VARIANT {
            return Err(BoardError::UnsupportedVariant(variant.to_string()));
        }
        Position::from_fen(fen)
    }
}

impl MoveGenerator for XiangqiRules {
    fn compute_position(
        &self,
        variant: &str,
        fen: &str,
        moves: &[String],
    ) -> Result<String, BoardError> {
        let mut pos = self.position(variant, fen)?;
        for mv in moves {
            let raw = Dialect::Uci.parse_move(mv).map_err(|_| BoardError::InvalidMove {
                moves: moves.to_vec(),
                reason: format!("malformed move '{mv}'"),
            })?;
            if !pos.is_legal(raw) {
                return Err(BoardError::InvalidMove {
                    moves: moves.to_vec(),
                    reason: format!("illegal move '{mv}' in {}", pos.to_fen()),
                });
            }
            pos.apply(raw);
        }
        Ok(pos.to_fen())
    }

    fn legal_moves(&self, variant: &str, fen: &str) -> Result<Vec<String>, BoardError> {
        Ok(self.position(variant, fen)?.legal_moves_in(Dialect::Uci))
    }

    fn is_in_check(&self, variant: &str, fen: &str) -> Result<bool, BoardError> {
        let pos = self.position(variant, fen)?;
        Ok(pos.in_check(pos.side()))
    }

    fn has_insufficient_material(
        &self,
        variant: &str,
        fen: &str,
    ) -> Result<(bool, bool), BoardError> {
        let pos = self.position(variant, fen)?;
        // 攻め駒（馬・車・砲・兵）が 1 枚もなければ詰ませられない
        let lacks = |color: Color| !pos.pieces(color).any(|(_, piece)| piece.kind.is_attacker());
        Ok((lacks(Color::Red), lacks(Color::Black)))
    }

    fn to_notation(&self, variant: &str, fen: &str, mv: &str) -> Result<String, BoardError> {
        let pos = self.position(variant, fen)?;
        let raw = Dialect::Uci.parse_move(mv)?;
        notation::wxf(&pos, raw).ok_or_else(|| BoardError::InvalidMove {
            moves: vec![mv.to_string()],
            reason: "no piece on origin square".to_string(),
        })
    }
}
