//! textcore - テキストバッファエンジン
//!
//! ギャップバッファ、ピーステーブル、ロープの3表現と、
//! ピーステーブルの undo/redo ログを提供

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod buffer;
pub mod cursor;
pub mod history;

// 文書層
pub mod document;
pub mod script;

// 公開API
pub use buffer::{GapBuffer, PieceTable, Rope, TextBuffer};
pub use config::CoreConfig;
pub use cursor::CursorPosition;
pub use document::{Document, Representation, TextChange};
pub use error::{BufferError, Result, TextCoreError};
pub use history::{EditRecord, HistoryStack};
