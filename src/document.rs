//! 文書モデル
//!
//! 3つのバッファ表現を1つのカーソルで並走させる。
//! undo/redo はピーステーブルだけが履歴を持つため、取り消し後は他の2表現を
//! ピーステーブルの再構築テキストから作り直す。リモートからの全文スナップショットも
//! 同じく全表現の再構築でしか受け付けない。

use std::fmt;
use std::fs;
use std::path::Path;

use crate::buffer::{GapBuffer, PieceTable, Rope, TextBuffer};
use crate::config::CoreConfig;
use crate::cursor::CursorPosition;
use crate::error::{BufferError, Result};

/// バッファ表現の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    GapBuffer,
    PieceTable,
    Rope,
}

impl Representation {
    pub const ALL: [Representation; 3] = [
        Representation::GapBuffer,
        Representation::PieceTable,
        Representation::Rope,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Representation::GapBuffer => "gap-buffer",
            Representation::PieceTable => "piece-table",
            Representation::Rope => "rope",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 2つのスナップショットの差分を1回の削除＋挿入で表したもの
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// 変更の開始位置
    pub position: usize,
    /// `position` から削除する文字数
    pub deleted: usize,
    /// 削除後に `position` へ挿入する文字列
    pub inserted: String,
}

impl TextChange {
    /// 共通の先頭・末尾を除いた差分を求める。同一なら `None`
    pub fn between(old: &str, new: &str) -> Option<Self> {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix = old_chars
            .iter()
            .zip(&new_chars)
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
        let suffix = old_chars
            .iter()
            .rev()
            .zip(new_chars.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let deleted = old_chars.len() - prefix - suffix;
        let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();
        if deleted == 0 && inserted.is_empty() {
            return None;
        }

        Some(Self {
            position: prefix,
            deleted,
            inserted,
        })
    }
}

/// 3表現を並走させる文書
#[derive(Debug, Clone)]
pub struct Document {
    gap: GapBuffer,
    table: PieceTable,
    rope: Rope,
    config: CoreConfig,
}

impl Document {
    /// 初期テキストから作成
    pub fn new(text: &str, config: &CoreConfig) -> Self {
        Self {
            gap: GapBuffer::from_str_with_capacity(text, config.gap_capacity),
            table: PieceTable::from_str(text),
            rope: Rope::with_leaf_size(text, config.rope_leaf_size),
            config: config.clone(),
        }
    }

    /// プレーンテキストファイルを開く
    pub fn open(path: &Path, config: &CoreConfig) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        log::info!("opened {} ({} chars)", path.display(), text.chars().count());
        Ok(Self::new(&text, config))
    }

    /// 現在のテキストを保存
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.text())?;
        log::info!("saved {}", path.display());
        Ok(())
    }

    pub fn gap_buffer(&self) -> &GapBuffer {
        &self.gap
    }

    pub fn piece_table(&self) -> &PieceTable {
        &self.table
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn cursor(&self) -> usize {
        self.table.cursor()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// 正本（ピーステーブル）のテキスト
    pub fn text(&self) -> String {
        self.table.text()
    }

    /// 各表現のテキスト
    pub fn snapshots(&self) -> Vec<(Representation, String)> {
        Representation::ALL
            .iter()
            .map(|&repr| (repr, self.buffer(repr).text()))
            .collect()
    }

    /// 3表現のテキストとカーソルが一致しているか
    pub fn is_consistent(&self) -> bool {
        let text = self.table.text();
        let cursor = self.table.cursor();
        Representation::ALL.iter().all(|&repr| {
            let buffer = self.buffer(repr);
            buffer.cursor() == cursor && buffer.text() == text
        })
    }

    fn buffer(&self, repr: Representation) -> &dyn TextBuffer {
        match repr {
            Representation::GapBuffer => &self.gap,
            Representation::PieceTable => &self.table,
            Representation::Rope => &self.rope,
        }
    }

    fn buffers_mut(&mut self) -> [&mut dyn TextBuffer; 3] {
        [&mut self.gap, &mut self.table, &mut self.rope]
    }

    /// 全表現のカーソルを `[0, len]` にクランプして移動
    pub fn move_cursor(&mut self, pos: usize) {
        let pos = pos.min(self.table.len());
        for buffer in self.buffers_mut() {
            buffer.move_cursor(pos);
        }
    }

    /// `pos` に文字列を挿入
    pub fn insert(&mut self, pos: usize, text: &str) -> Result<()> {
        self.move_cursor(pos);
        for buffer in self.buffers_mut() {
            buffer.insert_at_cursor(text)?;
        }
        Ok(())
    }

    /// `pos` の直前 `count` 文字（`[pos - count, pos)`）を削除
    ///
    /// # Errors
    /// `count` がクランプ後の `pos` を超える場合は `BufferError::InvalidRange`
    pub fn delete(&mut self, pos: usize, count: usize) -> Result<()> {
        let pos = pos.min(self.table.len());
        if count > pos {
            return Err(BufferError::InvalidRange {
                position: pos,
                count,
            }
            .into());
        }
        self.move_cursor(pos);
        for buffer in self.buffers_mut() {
            buffer.delete_at_cursor(count)?;
        }
        Ok(())
    }

    /// 行・列で指定した位置に挿入
    pub fn insert_at_line_column(&mut self, line: usize, column: usize, text: &str) -> Result<()> {
        let position = CursorPosition::from_line_column(&self.text(), line, column);
        self.insert(position.char_pos, text)
    }

    /// 行・列で指定した位置の直前 `count` 文字を削除
    pub fn delete_at_line_column(&mut self, line: usize, column: usize, count: usize) -> Result<()> {
        let position = CursorPosition::from_line_column(&self.text(), line, column);
        self.delete(position.char_pos, count)
    }

    /// 現在のカーソルを行・列で取得
    pub fn cursor_position(&self) -> CursorPosition {
        CursorPosition::from_offset(&self.text(), self.cursor())
    }

    /// 表示側の新しいスナップショットとの差分をローカル編集として適用する
    ///
    /// 差分は削除→挿入の順に適用されるので、undo ではそれぞれが別の手順になる
    pub fn apply_snapshot_diff(&mut self, new_text: &str) -> Result<Option<TextChange>> {
        let Some(change) = TextChange::between(&self.text(), new_text) else {
            return Ok(None);
        };
        if change.deleted > 0 {
            self.delete(change.position + change.deleted, change.deleted)?;
        }
        if !change.inserted.is_empty() {
            self.insert(change.position, &change.inserted)?;
        }
        Ok(Some(change))
    }

    /// 直前の編集を取り消し、他の表現を作り直す
    pub fn undo(&mut self) -> bool {
        if !self.table.undo() {
            return false;
        }
        self.rebuild_replicas();
        true
    }

    /// 取り消した編集をやり直し、他の表現を作り直す
    pub fn redo(&mut self) -> bool {
        if !self.table.redo() {
            return false;
        }
        self.rebuild_replicas();
        true
    }

    /// 同期サービスからの全文で置き換える（履歴は破棄される）
    pub fn apply_remote_snapshot(&mut self, text: &str) {
        self.table.reset(text);
        self.rebuild_replicas();
        log::info!("remote snapshot applied ({} chars)", self.table.len());
    }

    /// ピーステーブルのテキストからギャップバッファとロープを作り直す
    fn rebuild_replicas(&mut self) {
        let text = self.table.text();
        let cursor = self.table.cursor();

        self.gap = GapBuffer::from_str_with_capacity(&text, self.config.gap_capacity);
        self.rope = Rope::with_leaf_size(&text, self.config.rope_leaf_size);
        self.gap.move_cursor(cursor);
        self.rope.move_cursor(cursor);

        log::debug!("rebuilt replicas from piece table, cursor {}", cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TextCoreError;

    fn small_config() -> CoreConfig {
        CoreConfig {
            gap_capacity: 4,
            rope_leaf_size: 3,
            ..CoreConfig::default()
        }
    }

    #[test]
    fn test_text_change_insert() {
        let change = TextChange::between("Hello", "Hello World").unwrap();
        assert_eq!(
            change,
            TextChange {
                position: 5,
                deleted: 0,
                inserted: " World".to_string()
            }
        );
    }

    #[test]
    fn test_text_change_replace_in_repeated_text() {
        let change = TextChange::between("aaa", "aa").unwrap();
        assert_eq!(change.position, 2);
        assert_eq!(change.deleted, 1);
        assert!(change.inserted.is_empty());

        let change = TextChange::between("abcd", "aXd").unwrap();
        assert_eq!(change.position, 1);
        assert_eq!(change.deleted, 2);
        assert_eq!(change.inserted, "X");

        assert!(TextChange::between("same", "same").is_none());
    }

    #[test]
    fn test_edits_keep_representations_in_step() {
        let mut doc = Document::new("Hello", &small_config());
        doc.insert(5, " World").unwrap();
        doc.insert(0, ">> ").unwrap();
        doc.delete(8, 2).unwrap();
        assert_eq!(doc.text(), ">> Hel World");
        assert!(doc.is_consistent());
        assert_eq!(doc.cursor(), 6);
    }

    #[test]
    fn test_delete_past_start_rejected_everywhere() {
        let mut doc = Document::new("abc", &small_config());
        let result = doc.delete(1, 2);
        assert!(matches!(
            result,
            Err(TextCoreError::Buffer(BufferError::InvalidRange { .. }))
        ));
        assert_eq!(doc.text(), "abc");
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_undo_rebuilds_replicas() {
        let mut doc = Document::new("Hello", &small_config());
        doc.insert(5, " World").unwrap();
        doc.delete(11, 6).unwrap();
        assert!(doc.undo());
        assert_eq!(doc.rope().text(), "Hello World");
        assert_eq!(doc.gap_buffer().text(), "Hello World");
        assert!(doc.is_consistent());
        assert!(doc.undo());
        assert!(doc.redo());
        assert_eq!(doc.text(), "Hello World");
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_remote_snapshot_resets_history() {
        let mut doc = Document::new("local", &small_config());
        doc.insert(5, "!").unwrap();
        doc.apply_remote_snapshot("from the server");
        assert_eq!(doc.text(), "from the server");
        assert!(!doc.undo());
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_line_column_edits() {
        let mut doc = Document::new("one\ntwo\nthree", &small_config());
        doc.insert_at_line_column(1, 3, "!").unwrap();
        assert_eq!(doc.text(), "one\ntwo!\nthree");
        doc.delete_at_line_column(2, 5, 2).unwrap();
        assert_eq!(doc.text(), "one\ntwo!\nthr");
        assert_eq!(doc.cursor_position(), CursorPosition::at(12, 2, 3));
    }

    #[test]
    fn test_snapshot_diff_round_trip() {
        let mut doc = Document::new("the quick fox", &small_config());
        let change = doc.apply_snapshot_diff("the slow fox").unwrap().unwrap();
        assert_eq!(change.position, 4);
        assert_eq!(doc.text(), "the slow fox");
        assert!(doc.is_consistent());

        assert!(doc.undo());
        assert_eq!(doc.text(), "the  fox");
        assert!(doc.undo());
        assert_eq!(doc.text(), "the quick fox");
        assert_eq!(doc.apply_snapshot_diff("the quick fox").unwrap(), None);
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.txt");

        let mut doc = Document::new("draft", &small_config());
        doc.insert(5, " two").unwrap();
        doc.save(&path).unwrap();

        let reopened = Document::open(&path, &small_config()).unwrap();
        assert_eq!(reopened.text(), "draft two");
        assert!(reopened.is_consistent());
    }
}
