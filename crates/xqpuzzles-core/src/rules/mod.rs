//! 指し手生成器（外部協力者）のインターフェース
//!
//! 盤面アダプタは合法手生成・局面計算・表記変換を自前で持たず、すべてこの trait 経由で
//! 問い合わせる。指し手は UCI 方言（段 1 始まり）でやり取りする。
//! 呼び出しはすべて同期的で、引数を変更しない。

mod notation;
mod position;
mod xiangqi;

pub use xiangqi::XiangqiRules;

use crate::error::BoardError;

pub trait MoveGenerator: Send + Sync {
    /// `fen` に `moves` を順に適用した局面を返す。途中で不正な手があれば拒否する。
    fn compute_position(&self, variant: &str, fen: &str, moves: &[String])
        -> Result<String, BoardError>;

    /// 手番側の合法手一覧
    fn legal_moves(&self, variant: &str, fen: &str) -> Result<Vec<String>, BoardError>;

    /// 手番側が王手を受けているか
    fn is_in_check(&self, variant: &str, fen: &str) -> Result<bool, BoardError>;

    /// (紅, 黒) それぞれが駒不足で詰ませられないか
    fn has_insufficient_material(&self, variant: &str, fen: &str)
        -> Result<(bool, bool), BoardError>;

    /// 表示用の棋譜表記
    fn to_notation(&self, variant: &str, fen: &str, mv: &str) -> Result<String, BoardError>;
}
