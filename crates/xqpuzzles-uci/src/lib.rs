//! 象棋エンジン（UCI / UCCI）のドライバ
//!
//! - [`process`]: エンジンのサブプロセスと行単位の入出力
//! - [`session`]: ハンドシェイク・オプション設定・同期
//! - [`codec`]: 送信コマンドの組み立てと `info` / `bestmove` の解析
//! - [`evaluator`]: 探索の実行と multipv 行の集約
//! - [`engine`]: Fairy-Stockfish / Pikafish の差異を吸収する `AnalysisEngine`

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod process;
pub mod session;

pub use codec::{Clock, InfoRecord, SearchLimits};
pub use config::{EngineConfig, EngineKind};
pub use engine::{AnalysisEngine, FairyStockfish, LaunchEngine, Pikafish, start_engine};
pub use error::EngineError;
pub use evaluator::AnalysisLine;
pub use process::{EngineProcess, Transport};
pub use session::{EngineInfo, EngineSession, OptionValue};
