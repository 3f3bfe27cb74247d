//! 解析エンジンの共通インターフェースと 2 種類の実装
//!
//! Fairy-Stockfish は UCI 方言で `UCI_Variant` を毎回指定する必要がある。
//! Pikafish は象棋専用で UCCI 方言を使う。それ以外の手順は共通。

use log::info;
use xqpuzzles_core::{Board, BoardError, DEFAULT_VARIANT, Dialect};

use crate::codec::SearchLimits;
use crate::config::{EngineConfig, EngineKind};
use crate::error::EngineError;
use crate::evaluator::{self, AnalysisLine};
use crate::process::{EngineProcess, Transport};
use crate::session::{EngineSession, OptionValue};

pub trait AnalysisEngine {
    fn name(&self) -> &str;

    /// 指し手座標の方言
    fn dialect(&self) -> Dialect;

    fn is_ucci(&self) -> bool {
        self.dialect() == Dialect::Ucci
    }

    /// 探索前に毎回送るバリアント関連のオプション
    fn configure_for_variant(&mut self) -> Result<(), EngineError>;

    /// 上位 `multipv` 本の候補
    fn analysis(
        &mut self,
        board: &Board,
        limits: &SearchLimits,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError>;

    /// 最善の 1 本
    fn best_move(
        &mut self,
        board: &Board,
        limits: &SearchLimits,
    ) -> Result<AnalysisLine, EngineError>;

    /// このエンジンの方言に合わせた初期局面
    fn new_board(&self) -> Board {
        Board::new(self.dialect())
    }

    /// 設定ファイル由来の探索制限
    fn default_limits(&self) -> SearchLimits;

    /// 何度呼んでもよい
    fn quit(&mut self);
}

/// 設定からプロセスを起動して初期化する
pub trait LaunchEngine: Sized {
    fn start(config: &EngineConfig) -> Result<Self, EngineError>;
}

/// 両エンジン共通の初期化（ハンドシェイク、基本オプション、同期）
fn prepare<T: Transport>(
    session: &mut EngineSession<T>,
    config: &EngineConfig,
    fallback_name: &str,
) -> Result<String, EngineError> {
    let name = session
        .handshake()?
        .name
        .clone()
        .unwrap_or_else(|| fallback_name.to_string());
    for (option, value) in config.base_options() {
        session.set_option_if_available(&option, value)?;
    }
    session.await_ready()?;
    info!("{name} is ready");
    Ok(name)
}

fn spawn(config: &EngineConfig) -> Result<EngineProcess, EngineError> {
    EngineProcess::start(&config.program(), &config.args, config.working_dir.as_deref())
}

pub struct FairyStockfish<T: Transport = EngineProcess> {
    session: EngineSession<T>,
    config: EngineConfig,
    name: String,
}

impl<T: Transport> FairyStockfish<T> {
    pub fn from_session(mut session: EngineSession<T>, config: EngineConfig) -> Result<Self, EngineError> {
        let name = prepare(&mut session, &config, "Fairy-Stockfish")?;
        let variants = &session.info().variants;
        if !variants.is_empty() && !variants.iter().any(|v| v == DEFAULT_VARIANT) {
            return Err(BoardError::UnsupportedVariant(DEFAULT_VARIANT.to_string()).into());
        }
        Ok(FairyStockfish {
            session,
            config,
            name,
        })
    }

    pub fn session(&self) -> &EngineSession<T> {
        &self.session
    }
}

impl LaunchEngine for FairyStockfish<EngineProcess> {
    fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        FairyStockfish::from_session(EngineSession::new(spawn(config)?), config.clone())
    }
}

impl<T: Transport> AnalysisEngine for FairyStockfish<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::Uci
    }

    fn configure_for_variant(&mut self) -> Result<(), EngineError> {
        self.session.set_option_if_available("UCI_Chess960", OptionValue::Bool(false))?;
        self.session
            .set_option_if_available("UCI_Variant", OptionValue::from(DEFAULT_VARIANT))?;
        self.session.set_option_if_available("UCI_AnalyseMode", OptionValue::Bool(false))
    }

    fn analysis(
        &mut self,
        board: &Board,
        limits: &SearchLimits,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError> {
        self.configure_for_variant()?;
        evaluator::analyse(&mut self.session, board, limits, multipv)
    }

    fn best_move(&mut self, board: &Board, limits: &SearchLimits) -> Result<AnalysisLine, EngineError> {
        self.configure_for_variant()?;
        evaluator::best_line(&mut self.session, board, limits)
    }

    fn default_limits(&self) -> SearchLimits {
        self.config.limits()
    }

    fn quit(&mut self) {
        self.session.shutdown();
    }
}

pub struct Pikafish<T: Transport = EngineProcess> {
    session: EngineSession<T>,
    config: EngineConfig,
    name: String,
}

impl<T: Transport> Pikafish<T> {
    pub fn from_session(mut session: EngineSession<T>, config: EngineConfig) -> Result<Self, EngineError> {
        let name = prepare(&mut session, &config, "Pikafish")?;
        Ok(Pikafish {
            session,
            config,
            name,
        })
    }

    pub fn session(&self) -> &EngineSession<T> {
        &self.session
    }
}

impl LaunchEngine for Pikafish<EngineProcess> {
    fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        Pikafish::from_session(EngineSession::new(spawn(config)?), config.clone())
    }
}

impl<T: Transport> AnalysisEngine for Pikafish<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::Ucci
    }

    fn configure_for_variant(&mut self) -> Result<(), EngineError> {
        self.session
            .set_option_if_available("UCI_WDLCentipawn", OptionValue::Bool(false))
    }

    fn analysis(
        &mut self,
        board: &Board,
        limits: &SearchLimits,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError> {
        self.configure_for_variant()?;
        evaluator::analyse(&mut self.session, board, limits, multipv)
    }

    fn best_move(&mut self, board: &Board, limits: &SearchLimits) -> Result<AnalysisLine, EngineError> {
        self.configure_for_variant()?;
        evaluator::best_line(&mut self.session, board, limits)
    }

    fn default_limits(&self) -> SearchLimits {
        self.config.limits()
    }

    fn quit(&mut self) {
        self.session.shutdown();
    }
}

/// 設定に応じたエンジンを起動する
pub fn start_engine(config: &EngineConfig) -> Result<Box<dyn AnalysisEngine>, EngineError> {
    info!("starting {} ({})", config.kind, config.program().display());
    Ok(match config.kind {
        EngineKind::Pikafish => Box::new(Pikafish::<EngineProcess>::start(config)?),
        EngineKind::FairyStockfish => Box::new(FairyStockfish::<EngineProcess>::start(config)?),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use xqpuzzles_core::Score;

    use super::*;

    struct Scripted {
        replies: VecDeque<String>,
        sent: Vec<String>,
        closed: bool,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Scripted {
            Scripted {
                replies: replies.iter().map(|s| s.to_string()).collect(),
                sent: Vec::new(),
                closed: false,
            }
        }
    }

    impl Transport for Scripted {
        fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
            self.sent.push(line.to_string());
            Ok(())
        }

        fn recv_line(&mut self) -> Result<String, EngineError> {
            self.replies
                .pop_front()
                .ok_or_else(|| EngineError::protocol("script exhausted"))
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    const FAIRY_HANDSHAKE: &[&str] = &[
        "Fairy-Stockfish 14.0.1 LB by Fabian Fichter",
        "id name Fairy-Stockfish 14.0.1 LB",
        "id author Fabian Fichter",
        "option name Threads type spin default 1 min 1 max 512",
        "option name Hash type spin default 16 min 1 max 33554432",
        "option name MultiPV type spin default 1 min 1 max 500",
        "option name UCI_Chess960 type check default false",
        "option name UCI_Variant type combo default chess var chess var xiangqi var shogi",
        "option name UCI_AnalyseMode type check default false",
        "uciok",
        "readyok",
    ];

    #[test]
    fn test_fairy_stockfish_sends_variant_options_per_search() {
        let mut script: Vec<&str> = FAIRY_HANDSHAKE.to_vec();
        script.extend(["readyok", "info depth 2 score cp 31 pv h3e3", "bestmove h3e3"]);
        let session = EngineSession::new(Scripted::new(&script));
        let mut engine = FairyStockfish::from_session(session, EngineConfig::default()).unwrap();
        assert_eq!(engine.name(), "Fairy-Stockfish 14.0.1 LB");
        assert!(!engine.is_ucci());
        assert_eq!(engine.session().info().variants, vec!["chess", "xiangqi", "shogi"]);

        let board = engine.new_board();
        let line = engine.best_move(&board, &SearchLimits::depth(2)).unwrap();
        assert_eq!(line.score, Score::Cp(31));
        assert_eq!(line.notation.as_deref(), Some("C2=5"));

        let sent = &engine.session().transport_ref().sent;
        assert_eq!(sent[0], "uci");
        assert_eq!(sent[1], "setoption name Threads value 1");
        assert_eq!(sent[2], "setoption name Hash value 256");
        assert_eq!(sent[3], "isready");
        assert_eq!(sent[4], "setoption name UCI_Chess960 value false");
        assert_eq!(sent[5], "setoption name UCI_Variant value xiangqi");
        assert_eq!(sent[6], "setoption name UCI_AnalyseMode value false");
        assert_eq!(sent[7], "setoption name MultiPV value 1");

        engine.quit();
        assert!(engine.session().transport_ref().closed);
    }

    #[test]
    fn test_fairy_stockfish_without_xiangqi_is_rejected() {
        let script = [
            "id name Fairy-Stockfish",
            "option name UCI_Variant type combo default chess var chess var shogi",
            "uciok",
            "readyok",
        ];
        let session = EngineSession::new(Scripted::new(&script));
        let err = FairyStockfish::from_session(session, EngineConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Board(BoardError::UnsupportedVariant(_))));
    }

    #[test]
    fn test_pikafish_uses_ucci_and_skips_undeclared_options() {
        let script = [
            "Pikafish 2024 by the Pikafish developers",
            "id name Pikafish 2024",
            "option name Threads type spin default 1 min 1 max 1024",
            "option name Hash type spin default 16 min 1 max 33554432",
            "option name MultiPV type spin default 1 min 1 max 128",
            "uciok",
            "readyok",
            "readyok",
            "info depth 8 multipv 1 score cp 18 pv h2e2 h9g7",
            "info depth 8 multipv 2 score cp 11 pv b2e2",
            "bestmove h2e2 ponder h9g7",
        ];
        let session = EngineSession::new(Scripted::new(&script));
        let mut engine = Pikafish::from_session(session, EngineConfig::default()).unwrap();
        assert!(engine.is_ucci());

        let board = engine.new_board();
        let lines = engine.analysis(&board, &SearchLimits::depth(8), 2).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].mv.as_deref(), Some("h2e2"));

        let sent = &engine.session().transport_ref().sent;
        // UCI_WDLCentipawn は宣言されていないので送らない
        assert!(!sent.iter().any(|l| l.contains("UCI_WDLCentipawn")));
        assert!(sent.iter().any(|l| l == "setoption name MultiPV value 2"));
    }
}
