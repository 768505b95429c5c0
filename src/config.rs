//! 設定管理
//!
//! バッファの初期容量やロープの葉サイズなどを JSON ファイルから読み込む

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config::Result, ConfigError};

/// ギャップバッファの既定初期容量（文字スロット数）
pub const DEFAULT_GAP_CAPACITY: usize = 1024;
/// ロープの葉が保持できる既定最大文字数
pub const DEFAULT_ROPE_LEAF_SIZE: usize = 512;

const CONFIG_DIR_NAME: &str = "textcore";
const CONFIG_FILE_NAME: &str = "config.json";

/// textcore の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// ギャップバッファの初期容量
    pub gap_capacity: usize,
    /// ロープの葉の最大文字数
    pub rope_leaf_size: usize,
    /// ログレベル（`error` / `warn` / `info` / `debug` / `trace`）
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            gap_capacity: DEFAULT_GAP_CAPACITY,
            rope_leaf_size: DEFAULT_ROPE_LEAF_SIZE,
            log_level: "warn".to_string(),
        }
    }
}

impl CoreConfig {
    /// 指定ファイルから読み込み
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: display.clone(),
            message: e.to_string(),
        })?;
        let config: CoreConfig = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: display,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 明示パス → 既定パス → 既定値 の順で解決
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// 値の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.gap_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "gapCapacity".to_string(),
                value: self.gap_capacity.to_string(),
            });
        }
        if self.rope_leaf_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ropeLeafSize".to_string(),
                value: self.rope_leaf_size.to_string(),
            });
        }
        Ok(())
    }
}

/// 既定の設定ファイルパス（`<config_dir>/textcore/config.json`）
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "ropeLeafSize": 64 }"#).unwrap();

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.rope_leaf_size, 64);
        assert_eq!(config.gap_capacity, DEFAULT_GAP_CAPACITY);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_zero_leaf_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "ropeLeafSize": 0 }"#).unwrap();

        match CoreConfig::load(&path) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "ropeLeafSize"),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            CoreConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            CoreConfig::load_or_default(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
    }
}
