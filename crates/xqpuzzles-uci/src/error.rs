//! エンジン駆動のエラー型

use std::io;

use thiserror::Error;
use xqpuzzles_core::BoardError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// エンジンを起動できなかった。実行全体にとって致命的。
    #[error("failed to launch engine '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// 想定外の応答、あるいは応答の途中でストリームが閉じた
    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("engine I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl EngineError {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        EngineError::Protocol(msg.into())
    }
}
