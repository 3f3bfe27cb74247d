//! 象棋の対局記録から詰め象棋・駒得問題の候補を探すツール群

pub mod config;
pub mod export;
pub mod fetch;
pub mod games;
pub mod scanner;

pub use config::AppConfig;
pub use export::PuzzleSink;
pub use games::GameRecord;
pub use scanner::{PuzzleCandidate, PuzzleScanner, ScanPolicy, Theme};
