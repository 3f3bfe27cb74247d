//! エンジン起動とチューニングの設定
//!
//! TOML の `[engine]` テーブルから読み込む。省略された項目は既定値で埋める。

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::SearchLimits;
use crate::session::OptionValue;

pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_HASH_MB: u32 = 256;
pub const DEFAULT_DEPTH: u32 = 14;
pub const DEFAULT_MOVETIME_MS: u64 = 500;
/// 解析時の候補手数
pub const DEFAULT_MULTIPV: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// UCCI 方言（段 0 始まり）
    #[default]
    Pikafish,
    /// UCI 方言（段 1 始まり）
    #[serde(alias = "stockfish", alias = "fairy_stockfish")]
    FairyStockfish,
}

impl EngineKind {
    pub fn default_program(self) -> &'static str {
        match self {
            EngineKind::Pikafish => "pikafish",
            EngineKind::FairyStockfish => "fairy-stockfish",
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pikafish" => Ok(EngineKind::Pikafish),
            "stockfish" | "fairy-stockfish" | "fairy_stockfish" => Ok(EngineKind::FairyStockfish),
            other => Err(format!("unknown engine '{other}' (expected pikafish or stockfish)")),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Pikafish => f.write_str("pikafish"),
            EngineKind::FairyStockfish => f.write_str("stockfish"),
        }
    }
}

/// エンジンプロセス起動時の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    /// 省略時は `kind` の既定名で PATH から探す
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub threads: usize,
    pub hash_mb: u32,
    /// NNUE 評価関数ファイル
    pub eval_file: Option<PathBuf>,
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub multipv: usize,
    /// 追加の setoption (名前 → 値)
    pub options: BTreeMap<String, toml::Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            kind: EngineKind::default(),
            path: None,
            args: Vec::new(),
            working_dir: None,
            threads: DEFAULT_THREADS,
            hash_mb: DEFAULT_HASH_MB,
            eval_file: None,
            depth: Some(DEFAULT_DEPTH),
            movetime_ms: Some(DEFAULT_MOVETIME_MS),
            nodes: None,
            multipv: DEFAULT_MULTIPV,
            options: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn program(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.kind.default_program()))
    }

    /// 1 局面あたりの探索制限
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            depth: self.depth,
            movetime_ms: self.movetime_ms,
            nodes: self.nodes,
            clock: None,
        }
    }

    /// 起動直後に送るオプション
    pub fn base_options(&self) -> Vec<(String, OptionValue)> {
        let mut options = vec![
            ("Threads".to_string(), OptionValue::Int(self.threads as i64)),
            ("Hash".to_string(), OptionValue::Int(self.hash_mb as i64)),
        ];
        if let Some(eval_file) = &self.eval_file {
            options.push((
                "EvalFile".to_string(),
                OptionValue::Str(eval_file.display().to_string()),
            ));
        }
        for (name, value) in &self.options {
            options.push((name.clone(), toml_to_option(value)));
        }
        options
    }
}

fn toml_to_option(value: &toml::Value) -> OptionValue {
    match value {
        toml::Value::Boolean(b) => OptionValue::Bool(*b),
        toml::Value::Integer(i) => OptionValue::Int(*i),
        toml::Value::String(s) if s.is_empty() => OptionValue::None,
        toml::Value::String(s) => OptionValue::Str(s.clone()),
        other => OptionValue::Str(other.to_string()),
    }
}
