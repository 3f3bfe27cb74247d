//! 盤面操作のエラー型

use thiserror::Error;

/// 盤面アダプタおよび指し手生成器が返すエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// 指し手列が受理されなかった（盤面は変更されない）
    #[error("{moves:?} is not a valid move sequence: {reason}")]
    InvalidMove { moves: Vec<String>, reason: String },

    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("invalid move coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("unsupported variant '{0}'")]
    UnsupportedVariant(String),
}

impl BoardError {
    pub(crate) fn invalid_fen(fen: &str, reason: impl Into<String>) -> Self {
        BoardError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.into(),
        }
    }
}
