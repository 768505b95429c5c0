//! バッファ管理モジュール
//!
//! 同じ文字列を表す3種類のインメモリ表現（ギャップバッファ、ピーステーブル、ロープ）と、
//! それらに共通するカーソル相対の編集インターフェースを提供

pub mod gap_buffer;
pub mod piece_table;
pub mod rope;

// 公開API
pub use gap_buffer::GapBuffer;
pub use piece_table::{Piece, PieceSource, PieceTable};
pub use rope::Rope;

use crate::error::Result;

/// カーソル相対の編集操作インターフェース
///
/// 位置・長さはすべて文字（`char`）単位。カーソルは呼び出し側が動かし、
/// 挿入と削除は常に現在のカーソル位置に対して行われる。
pub trait TextBuffer {
    /// 現在のカーソル位置
    fn cursor(&self) -> usize;

    /// カーソルを移動
    fn move_cursor(&mut self, pos: usize);

    /// カーソル位置に文字列を挿入し、カーソルを挿入文字数だけ進める
    fn insert_at_cursor(&mut self, text: &str) -> Result<()>;

    /// カーソル直前の `count` 文字を削除
    fn delete_at_cursor(&mut self, count: usize) -> Result<()>;

    /// 全テキストを再構築
    fn text(&self) -> String;

    /// 文字数
    fn len(&self) -> usize;

    /// 空かどうかを判定
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
