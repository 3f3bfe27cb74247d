//! 基本型（手番・マス・駒・評価値）

mod color;
mod piece;
mod score;
mod square;

pub use color::Color;
pub use piece::{Piece, PieceKind};
pub use score::{Bound, PovScore, Score};
pub use square::{Square, FILES, RANKS};
