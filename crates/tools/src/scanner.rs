//! 棋譜を 1 手ずつ解析して詰将棋ならぬ「詰め象棋」候補を探す
//!
//! 状態は `SkippingPrelude → Scanning → Done` の順に進む。序盤の `skip_initial` 手は
//! まとめて進め、以降は 1 手ごとに最善手探索を 1 回行い、直前の評価値との差で判定する。
//! 評価に失敗した手は飛ばし、直前の評価値はそのまま持ち越す。

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use xqpuzzles_core::{Board, BoardError, Color, Dialect, Score};
use xqpuzzles_uci::{AnalysisEngine, AnalysisLine, SearchLimits};

/// 読み筋から手数を決められなかったときの既定値
pub const FALLBACK_PUZZLE_LENGTH: usize = 2;

/// 候補判定のしきい値
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPolicy {
    /// 評価値の振れ幅（centipawn）
    pub swing_threshold: i32,
    /// 手番側から見た評価値がこの値より大きいこと
    pub score_floor: i32,
    /// 手番側から見た評価値がこの値以下であること
    pub score_ceiling: i32,
    /// 大駒の枚数差がこの値以上なら判定しない。`None` で無効。
    pub material_gate: Option<u32>,
    /// 手番側が勝つ詰みの最大手数
    pub mate_horizon: i32,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        ScanPolicy {
            swing_threshold: 400,
            score_floor: 0,
            score_ceiling: 2000,
            material_gate: Some(3),
            mate_horizon: 10,
        }
    }
}

impl ScanPolicy {
    /// しきい値を緩めて駒得判定を外したプリセット
    pub fn relaxed() -> ScanPolicy {
        ScanPolicy {
            swing_threshold: 300,
            score_floor: 300,
            score_ceiling: 1500,
            material_gate: None,
            ..ScanPolicy::default()
        }
    }

    /// 評価値の急変（直前・直後とも centipawn のときのみ）
    pub fn is_capturing(&self, prev: Score, cur: Score, turn: Color) -> bool {
        let (Some(a), Some(b)) = (prev.cp(), cur.cp()) else {
            return false;
        };
        let relative = b * turn.sign();
        (b - a).abs() >= self.swing_threshold
            && self.score_floor < relative
            && relative <= self.score_ceiling
    }

    /// 手番側が `mate_horizon` 手以内に詰ませられる
    pub fn is_near_mate(&self, cur: Score, turn: Color) -> bool {
        match cur.mate() {
            Some(mate) => (1..=self.mate_horizon).contains(&(mate * turn.sign())),
            None => false,
        }
    }

    /// 駒得判定で弾かれるか
    pub fn gated(&self, board: &Board) -> bool {
        self.material_gate
            .is_some_and(|gate| board.material_balance() >= gate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    Checkmate,
    Capturing,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Checkmate => "CHECKMATE",
            Theme::Capturing => "CAPTURING",
        }
    }
}

/// 見つかった候補局面
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleCandidate {
    /// 候補局面までに指された手数
    pub ply: usize,
    pub fen: String,
    /// 候補局面で手番の側（= 解く側）
    pub first_turn: Color,
    /// エンジン方言の読み筋
    pub pv: Vec<String>,
    /// 紅視点
    pub score: Score,
    pub theme: Theme,
    pub moves_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    SkippingPrelude,
    Scanning { next: usize, prev: Option<Score> },
    Done,
}

pub struct PuzzleScanner<'e> {
    engine: &'e mut dyn AnalysisEngine,
    policy: ScanPolicy,
    limits: SearchLimits,
    skip_initial: usize,
    /// 入力棋譜の方言
    input_dialect: Dialect,
}

impl<'e> PuzzleScanner<'e> {
    pub fn new(engine: &'e mut dyn AnalysisEngine, policy: ScanPolicy) -> PuzzleScanner<'e> {
        let limits = engine.default_limits();
        PuzzleScanner {
            engine,
            policy,
            limits,
            skip_initial: 5,
            input_dialect: Dialect::Uci,
        }
    }

    pub fn skip_initial(mut self, plies: usize) -> Self {
        self.skip_initial = plies;
        self
    }

    pub fn limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn input_dialect(mut self, dialect: Dialect) -> Self {
        self.input_dialect = dialect;
        self
    }

    fn evaluate(&mut self, board: &Board) -> Option<AnalysisLine> {
        match self.engine.best_move(board, &self.limits) {
            Ok(line) => Some(line),
            Err(err) => {
                warn!("evaluation failed at ply {}: {err}", board.len());
                None
            }
        }
    }

    /// 1 局分を走査する。不正な手に当たったらその局を打ち切る。
    pub fn scan<S: AsRef<str>>(&mut self, moves: &[S]) -> Result<Vec<PuzzleCandidate>, BoardError> {
        let mut board = self.engine.new_board();
        let mut puzzles = Vec::new();
        let mut state = ScanState::SkippingPrelude;
        let skip = self.skip_initial.min(moves.len());

        info!(
            "scanning {} moves (skip {skip}, depth {:?}, movetime {:?})",
            moves.len(),
            self.limits.depth,
            self.limits.movetime_ms
        );
        loop {
            state = match state {
                ScanState::SkippingPrelude => {
                    board.push(&moves[..skip], self.input_dialect)?;
                    let prev = self.evaluate(&board).map(|line| line.score);
                    debug!("baseline at ply {skip}: {prev:?}");
                    ScanState::Scanning { next: skip, prev }
                }
                ScanState::Scanning { next, .. } if next >= moves.len() => ScanState::Done,
                ScanState::Scanning { next, prev } => {
                    let mv = moves[next].as_ref();
                    let mut next_board = board.copy();
                    next_board.push(&[mv], self.input_dialect)?;

                    let prev = match self.evaluate(&next_board) {
                        Some(line) => {
                            let found = self.classify(prev, &next_board, &line);
                            let turn = next_board.turn();
                            info!(
                                "{}{:<5} {mv:<6} {}",
                                if found.is_some() { "* " } else { "  " },
                                turn.label(),
                                line.score
                            );
                            puzzles.extend(found);
                            Some(line.score)
                        }
                        None => prev,
                    };
                    board = next_board;
                    ScanState::Scanning {
                        next: next + 1,
                        prev,
                    }
                }
                ScanState::Done => break,
            };
        }
        info!("found {} puzzle candidates", puzzles.len());
        Ok(puzzles)
    }

    fn classify(
        &self,
        prev: Option<Score>,
        board: &Board,
        line: &AnalysisLine,
    ) -> Option<PuzzleCandidate> {
        if self.policy.gated(board) {
            return None;
        }
        let turn = board.turn();
        let cur = line.score;
        let capturing = prev.is_some_and(|prev| self.policy.is_capturing(prev, cur, turn));
        if !capturing && !self.policy.is_near_mate(cur, turn) {
            return None;
        }
        Some(PuzzleCandidate {
            ply: board.len(),
            fen: board.fen().to_string(),
            first_turn: turn,
            pv: line.pv.clone(),
            score: cur,
            theme: if cur.is_mate() {
                Theme::Checkmate
            } else {
                Theme::Capturing
            },
            moves_count: puzzle_length(board, line),
        })
    }
}

/// 解く側の手数の見積もり
///
/// 詰みならその手数。それ以外は読み筋を進めながら各手で取られる駒を記録し、解く側の手
/// （奇数手目）について、直前の解く側の手が駒を取っていて今回は取らない最初の位置で打ち切る。
pub fn puzzle_length(board: &Board, line: &AnalysisLine) -> usize {
    if let Some(mate) = line.score.mate() {
        return mate.unsigned_abs() as usize;
    }

    let dialect = board.dialect();
    let mut walk = board.copy();
    let mut captured = Vec::with_capacity(line.pv.len());
    for mv in &line.pv {
        let piece = walk.captured_piece_at(mv, dialect);
        match (piece, walk.push(&[mv.as_str()], dialect)) {
            (Ok(piece), Ok(())) => captured.push(piece),
            (Err(err), _) | (_, Err(err)) => {
                debug!("stopped walking pv at {mv}: {err}");
                break;
            }
        }
    }

    let mut last = None;
    for move_no in (1..=captured.len()).step_by(2) {
        let current = captured[move_no - 1];
        if last.is_some() && current.is_none() {
            return (move_no - 1) / 2;
        }
        last = current;
    }
    FALLBACK_PUZZLE_LENGTH
}
