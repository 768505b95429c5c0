//! エラーハンドリングシステム
//!
//! textcore 全体で使用される統一されたエラー型を定義
//! 範囲外のカーソル指定や空の編集は黙ってクランプ／無視し、
//! 呼び出し側の契約違反だけをエラーとして返す

use thiserror::Error;

/// クレート全体のエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextCoreError {
    /// バッファ操作エラー
    #[error("Buffer operation failed: {0}")]
    Buffer(#[from] BufferError),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// ファイル入出力エラー
    #[error("IO error: {message}")]
    Io { message: String },

    /// 編集スクリプトの解釈エラー
    #[error("Script error: {0}")]
    Script(String),
}

/// バッファ操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// カーソルより手前の文字数を超える削除要求
    #[error("Cannot delete {count} characters before position {position}")]
    InvalidRange { position: usize, count: usize },
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid configuration file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, TextCoreError>;

/// 各モジュール固有のResult型
pub mod buffer {
    pub type Result<T> = std::result::Result<T, super::BufferError>;
}

pub mod config {
    pub type Result<T> = std::result::Result<T, super::ConfigError>;
}

// std::io::Error から TextCoreError への変換
impl From<std::io::Error> for TextCoreError {
    fn from(error: std::io::Error) -> Self {
        TextCoreError::Io {
            message: error.to_string(),
        }
    }
}

// serde_json のエラーはスクリプトエラーとして扱う
impl From<serde_json::Error> for TextCoreError {
    fn from(error: serde_json::Error) -> Self {
        TextCoreError::Script(error.to_string())
    }
}
