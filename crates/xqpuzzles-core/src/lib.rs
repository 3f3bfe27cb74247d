//! 象棋（xiangqi）パズル抽出のための盤面アダプタと指し手表記ユーティリティ。
//!
//! - [`board::Board`]: 指し手スタックと現在局面（FEN）を保持し、合法性判定などを
//!   [`rules::MoveGenerator`] に委譲する
//! - [`dialect`]: UCI（1始まりの段）と UCCI（0始まりの段）の相互変換
//! - [`rules::XiangqiRules`]: 組み込みの指し手生成器

pub mod board;
pub mod dialect;
pub mod error;
pub mod fen;
pub mod rules;
pub mod types;

pub use board::{Board, GameStatus, DEFAULT_VARIANT, XIANGQI_START_FEN};
pub use dialect::Dialect;
pub use error::BoardError;
pub use rules::{MoveGenerator, XiangqiRules};
pub use types::{Bound, Color, Piece, PieceKind, PovScore, Score, Square};
