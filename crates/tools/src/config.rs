//! ツール全体の設定ファイル
//!
//! ```toml
//! [engine]
//! kind = "pikafish"
//! path = "./pikafish"
//! working_dir = "/opt/pikafish"
//! eval_file = "/opt/pikafish/pikafish.nnue"
//! depth = 14
//! movetime_ms = 500
//!
//! [scan]
//! swing_threshold = 400
//! material_gate = 3
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use xqpuzzles_uci::EngineConfig;

use crate::scanner::ScanPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub scan: ScanPolicy,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<AppConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;
    use xqpuzzles_uci::EngineKind;

    use super::*;

    #[test]
    fn test_load_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xqpuzzles.toml");
        fs::write(
            &path,
            r#"
            [engine]
            kind = "stockfish"
            path = "./fairy-stockfish"
            threads = 2

            [scan]
            swing_threshold = 350
            "#,
        )
        .unwrap();

        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.engine.kind, EngineKind::FairyStockfish);
        assert_eq!(cfg.engine.path, Some(PathBuf::from("./fairy-stockfish")));
        assert_eq!(cfg.engine.threads, 2);
        assert_eq!(cfg.engine.hash_mb, 256);
        assert_eq!(cfg.scan.swing_threshold, 350);
        assert_eq!(cfg.scan.material_gate, Some(3));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load(Path::new("/no/such/config.toml")).is_err());
    }
}
