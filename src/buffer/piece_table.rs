//! ピーステーブル実装
//!
//! 不変の元テキストと追記専用の追加テキストを持ち、文書をその2つへの参照（ピース）の
//! 列として表現する。undo/redo を持つのはこの表現だけで、他の表現を同期させる際の
//! 正本になる。

use crate::buffer::TextBuffer;
use crate::error::{self, BufferError, Result};
use crate::history::{EditRecord, HistoryStack};

/// ピースが参照するバッファ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceSource {
    /// 構築時／リセット時の元テキスト
    Original,
    /// 追記専用の追加テキスト
    Added,
}

/// ピース記述子（参照先バッファ、開始位置、長さ。いずれも文字単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub source: PieceSource,
    pub start: usize,
    pub len: usize,
}

impl Piece {
    fn end(&self) -> usize {
        self.start + self.len
    }

    /// `offset` で2つに分割（`0 < offset < len` が前提）
    fn split(self, offset: usize) -> (Piece, Piece) {
        debug_assert!(offset > 0 && offset < self.len);
        (
            Piece {
                len: offset,
                ..self
            },
            Piece {
                start: self.start + offset,
                len: self.len - offset,
                ..self
            },
        )
    }
}

/// ピーステーブル本体
#[derive(Debug, Clone, Default)]
pub struct PieceTable {
    /// 元テキスト
    original: Vec<char>,
    /// 追加テキスト（追記のみ、reset まで縮まない）
    added: Vec<char>,
    /// ピース列
    pieces: Vec<Piece>,
    /// ピース長の合計
    len: usize,
    /// カーソル位置（`0..=len`）
    cursor: usize,
    /// undo/redo ログ
    history: HistoryStack,
}

impl PieceTable {
    /// 空のピーステーブルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 文字列から作成（1ピース、カーソルは末尾）
    pub fn from_str(text: &str) -> Self {
        let mut table = Self::new();
        table.reset(text);
        table
    }

    /// 全状態（両ログを含む）を破棄して `initial` から作り直す
    pub fn reset(&mut self, initial: &str) {
        self.original = initial.chars().collect();
        self.added.clear();
        self.len = self.original.len();
        self.pieces.clear();
        if self.len > 0 {
            self.pieces.push(Piece {
                source: PieceSource::Original,
                start: 0,
                len: self.len,
            });
        }
        self.cursor = self.len;
        self.history.clear();
        self.debug_check();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// カーソルを `[0, len]` にクランプして移動
    pub fn move_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.len);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// ピース列を参照
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// 追加テキストの長さ（文字数）
    pub fn added_len(&self) -> usize {
        self.added.len()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_len()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_len()
    }

    /// カーソル位置に文字列を挿入し、undo ログへ記録する
    pub fn insert_at_cursor(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let position = self.cursor;
        let inserted = self.insert_text(position, text);
        self.cursor = position + inserted;
        self.history.push(EditRecord::Insert {
            position,
            text: text.to_string(),
        });
        self.debug_check();
        log::trace!("piece table insert {} chars at {}", inserted, position);
    }

    /// カーソル直前の `count` 文字を削除し、undo ログへ記録する
    ///
    /// # Errors
    /// `count` がカーソル位置を超える場合は `BufferError::InvalidRange`
    pub fn delete_at_cursor(&mut self, count: usize) -> error::buffer::Result<()> {
        if count == 0 {
            return Ok(());
        }
        if count > self.cursor {
            return Err(BufferError::InvalidRange {
                position: self.cursor,
                count,
            });
        }

        let position = self.cursor - count;
        let pieces = self.delete_range(position, count);
        self.cursor = position;
        self.history.push(EditRecord::Delete { position, pieces });
        self.debug_check();
        log::trace!("piece table delete {} chars at {}", count, position);
        Ok(())
    }

    /// 直前の編集を取り消す。ログが空なら何もせず `false`
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.history.take_for_undo() else {
            return false;
        };

        match &record {
            EditRecord::Insert { position, text } => {
                self.delete_range(*position, text.chars().count());
                self.cursor = *position;
            }
            EditRecord::Delete { position, pieces } => {
                let restored: usize = pieces.iter().map(|piece| piece.len).sum();
                self.insert_pieces(*position, pieces);
                self.cursor = position + restored;
            }
        }

        self.debug_check();
        log::debug!("undo {} at {}", kind(&record), record.position());
        self.history.push_redo(record);
        true
    }

    /// 取り消した編集をやり直す。ログが空なら何もせず `false`
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.history.take_for_redo() else {
            return false;
        };

        match &record {
            EditRecord::Insert { position, text } => {
                let inserted = self.insert_text(*position, text);
                self.cursor = position + inserted;
            }
            EditRecord::Delete { position, .. } => {
                self.delete_range(*position, record.len());
                self.cursor = *position;
            }
        }

        self.debug_check();
        log::debug!("redo {} at {}", kind(&record), record.position());
        self.history.push_without_clearing(record);
        true
    }

    /// 全テキストを再構築
    pub fn text(&self) -> String {
        let mut result = String::with_capacity(self.len);
        for piece in &self.pieces {
            result.extend(self.piece_chars(piece));
        }
        result
    }

    /// `pos` から最大 `len` 文字を取り出す（文書末尾でクランプ）
    pub fn substring(&self, pos: usize, len: usize) -> String {
        let mut result = String::new();
        let mut remaining = len.min(self.len.saturating_sub(pos));
        let mut offset = 0;

        for piece in &self.pieces {
            if remaining == 0 {
                break;
            }
            let piece_end = offset + piece.len;
            if piece_end > pos {
                let skip = pos.saturating_sub(offset);
                let take = (piece.len - skip).min(remaining);
                result.extend(self.piece_chars(piece)[skip..skip + take].iter());
                remaining -= take;
            }
            offset = piece_end;
        }

        result
    }

    fn piece_chars(&self, piece: &Piece) -> &[char] {
        let source = match piece.source {
            PieceSource::Original => &self.original,
            PieceSource::Added => &self.added,
        };
        &source[piece.start..piece.end()]
    }

    /// `pos` にピース境界を作り、その位置から始まるピースのインデックスを返す
    ///
    /// 境界上の位置では分割しないので長さ0のピースは生じない
    fn split_at(&mut self, pos: usize) -> usize {
        let mut offset = 0;
        for idx in 0..self.pieces.len() {
            if pos == offset {
                return idx;
            }
            let piece = self.pieces[idx];
            if pos < offset + piece.len {
                let (head, tail) = piece.split(pos - offset);
                self.pieces[idx] = head;
                self.pieces.insert(idx + 1, tail);
                return idx + 1;
            }
            offset += piece.len;
        }
        self.pieces.len()
    }

    /// 追加テキストへ追記し、その範囲を `pos` に挿入する（記録なし）
    fn insert_text(&mut self, pos: usize, text: &str) -> usize {
        let start = self.added.len();
        self.added.extend(text.chars());
        let inserted = self.added.len() - start;
        if inserted == 0 {
            return 0;
        }

        let idx = self.split_at(pos);
        // 直前のピースが追加テキストの末尾で終わっていれば伸ばすだけで済む
        let extends_previous = idx > 0 && {
            let prev = &self.pieces[idx - 1];
            prev.source == PieceSource::Added && prev.end() == start
        };
        if extends_previous {
            self.pieces[idx - 1].len += inserted;
        } else {
            self.pieces.insert(
                idx,
                Piece {
                    source: PieceSource::Added,
                    start,
                    len: inserted,
                },
            );
        }

        self.len += inserted;
        inserted
    }

    /// 保持していたピース断片を `pos` にそのまま戻す（記録なし）
    fn insert_pieces(&mut self, pos: usize, pieces: &[Piece]) {
        let idx = self.split_at(pos);
        let restored: usize = pieces.iter().map(|piece| piece.len).sum();
        let tail = self.pieces.split_off(idx);
        self.pieces
            .extend(pieces.iter().copied().filter(|piece| piece.len > 0));
        self.pieces.extend(tail);
        self.len += restored;
    }

    /// `[pos, pos + count)` を取り除き、取り除いたピース断片を返す（記録なし）
    fn delete_range(&mut self, pos: usize, count: usize) -> Vec<Piece> {
        let end = (pos + count).min(self.len);
        if pos >= end {
            return Vec::new();
        }

        let first = self.split_at(pos);
        let last = self.split_at(end);
        let removed: Vec<Piece> = self.pieces.drain(first..last).collect();
        self.len -= end - pos;
        removed
    }

    /// 構造不変条件を検証（公開操作の完了後に成り立つ）
    ///
    /// * ピース長の合計が文書長と一致
    /// * 長さ0のピースが存在しない
    /// * 各ピースが参照先バッファの範囲内
    pub fn check_invariants(&self) -> bool {
        let total: usize = self.pieces.iter().map(|piece| piece.len).sum();
        let in_bounds = self.pieces.iter().all(|piece| {
            let source_len = match piece.source {
                PieceSource::Original => self.original.len(),
                PieceSource::Added => self.added.len(),
            };
            piece.len > 0 && piece.end() <= source_len
        });
        total == self.len && in_bounds && self.cursor <= self.len
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariants(),
            "piece table invariants broken: {:?}",
            self.pieces
        );
    }
}

fn kind(record: &EditRecord) -> &'static str {
    match record {
        EditRecord::Insert { .. } => "insert",
        EditRecord::Delete { .. } => "delete",
    }
}

impl TextBuffer for PieceTable {
    fn cursor(&self) -> usize {
        self.cursor
    }

    fn move_cursor(&mut self, pos: usize) {
        PieceTable::move_cursor(self, pos);
    }

    fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        PieceTable::insert_at_cursor(self, text);
        Ok(())
    }

    fn delete_at_cursor(&mut self, count: usize) -> Result<()> {
        PieceTable::delete_at_cursor(self, count)?;
        Ok(())
    }

    fn text(&self) -> String {
        PieceTable::text(self)
    }

    fn len(&self) -> usize {
        self.len
    }
}
