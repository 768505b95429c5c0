//! ロギングシステム
//!
//! `log` ファサードのバックエンドとして動作するロガーを提供
//! バッファ実装は `log::debug!` などのマクロだけを使い、出力先はここで決める

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// ロガー
///
/// * 既定では stderr へ出力
/// * ファイル出力を指定した場合は追記モードで書き込む
#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
    output_stderr: bool,
    output_file: Option<PathBuf>,
}

impl Logger {
    /// デフォルト構築
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            output_stderr: true,
            output_file: None,
        }
    }

    /// 開発者向けロガー
    pub fn for_development() -> Self {
        Self::new(LevelFilter::Debug)
    }

    /// ログレベルを取得
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// ログレベルを変更
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// ファイル出力を設定
    pub fn with_file_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// 標準エラー出力を無効化（テスト向け）
    pub fn without_stderr(mut self) -> Self {
        self.output_stderr = false;
        self
    }

    fn should_log(&self, level: Level) -> bool {
        level <= self.level
    }

    fn write_line(&self, message: &str) {
        if self.output_stderr {
            eprintln!("{}", message);
        }

        if let Some(path) = &self.output_file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", message);
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.should_log(metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.write_line(&format!(
            "{} [{}] {}",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

/// 設定文字列からログレベルを解釈（不明な値は `Warn`）
pub fn parse_level(value: &str) -> LevelFilter {
    value.trim().parse().unwrap_or(LevelFilter::Warn)
}

/// グローバルロガーをインストール
///
/// 2回目以降の呼び出しは最初のロガーを維持し、最大レベルだけを更新する
pub fn init(logger: Logger) {
    let level = logger.level();
    let installed = LOGGER.get_or_init(|| logger);
    // 既に他のロガーが登録済みでも失敗扱いにはしない
    let _ = log::set_logger(installed);
    log::set_max_level(level);
}
