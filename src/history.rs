//! 編集履歴
//!
//! ピーステーブルの undo/redo ログ。挿入は文字列、削除は取り除いたピース断片を
//! そのまま保持するので、undo はバックエンドの元の範囲から正確に復元できる。

use crate::buffer::piece_table::Piece;

/// 可逆な編集レコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRecord {
    /// `position` に `text` を挿入した
    Insert { position: usize, text: String },
    /// `position` から始まる範囲を削除し、その断片が `pieces`
    Delete { position: usize, pieces: Vec<Piece> },
}

impl EditRecord {
    /// 編集範囲の開始位置
    pub fn position(&self) -> usize {
        match self {
            EditRecord::Insert { position, .. } | EditRecord::Delete { position, .. } => *position,
        }
    }

    /// 編集された文字数
    pub fn len(&self) -> usize {
        match self {
            EditRecord::Insert { text, .. } => text.chars().count(),
            EditRecord::Delete { pieces, .. } => pieces.iter().map(|piece| piece.len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 直前のレコードに吸収できるなら吸収して `true` を返す
    fn try_absorb(&mut self, next: &EditRecord) -> bool {
        match (self, next) {
            (
                EditRecord::Insert {
                    position: prev_pos,
                    text: prev_text,
                },
                EditRecord::Insert {
                    position: new_pos,
                    text: new_text,
                },
            ) => {
                if !can_merge_insert(*prev_pos, prev_text, *new_pos, new_text) {
                    return false;
                }
                prev_text.push_str(new_text);
                true
            }
            _ => false,
        }
    }
}

/// 挿入の結合条件
///
/// 新しい文字列が空白を含まず、直前の挿入が空白で終わっておらず、
/// 直前の挿入の末尾にちょうど続く場合のみ結合する
fn can_merge_insert(prev_pos: usize, prev_text: &str, new_pos: usize, new_text: &str) -> bool {
    if new_text.is_empty() || new_text.chars().any(char::is_whitespace) {
        return false;
    }

    if prev_text.chars().last().map_or(false, char::is_whitespace) {
        return false;
    }

    new_pos == prev_pos + prev_text.chars().count()
}

/// 編集履歴スタック
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    undo: Vec<EditRecord>,
    redo: Vec<EditRecord>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// undo ログを古い順に参照
    pub fn undo_entries(&self) -> &[EditRecord] {
        &self.undo
    }

    /// 新しい編集を記録する。結合の有無にかかわらず redo ログは破棄される
    pub fn push(&mut self, record: EditRecord) {
        self.redo.clear();
        if let Some(last) = self.undo.last_mut() {
            if last.try_absorb(&record) {
                return;
            }
        }
        self.undo.push(record);
    }

    pub fn take_for_undo(&mut self) -> Option<EditRecord> {
        self.undo.pop()
    }

    pub fn push_redo(&mut self, record: EditRecord) {
        self.redo.push(record);
    }

    pub fn take_for_redo(&mut self) -> Option<EditRecord> {
        self.redo.pop()
    }

    /// redo の再適用後に undo ログへ戻す（redo ログは保持）
    pub fn push_without_clearing(&mut self, record: EditRecord) {
        self.undo.push(record);
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
