//! ギャップバッファ実装
//!
//! カーソル位置に空き領域（ギャップ）を保持する固定長の文字スロット列。
//! カーソル位置での挿入・削除は O(1)、カーソルの移動はギャップを1スロットずつ
//! 移し替えるため移動距離に比例する。

use crate::buffer::TextBuffer;
use crate::config::DEFAULT_GAP_CAPACITY;
use crate::error::Result;

/// ギャップ内の未使用スロットを埋める値
const GAP_FILL: char = '\0';
const GAP_GROWTH_FACTOR: usize = 2;

/// ギャップバッファ構造体
///
/// `buffer[gap_start..gap_end]` が未使用領域。カーソルは常に `gap_start` と一致する。
/// ギャップが尽きた状態で挿入すると全体容量を倍にして内容を移し替える。縮小はしない。
///
/// 範囲外へのカーソル移動は端で止まるだけで、クランプは呼び出し側の責任とする。
#[derive(Debug, Clone)]
pub struct GapBuffer {
    /// 内部バッファ（文字スロット列）
    buffer: Vec<char>,
    /// ギャップの開始位置（= カーソル）
    gap_start: usize,
    /// ギャップの終了位置（排他的）
    gap_end: usize,
}

impl GapBuffer {
    /// 既定容量で新しいギャップバッファを作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_GAP_CAPACITY)
    }

    /// 指定容量で新しいギャップバッファを作成（最低1スロット）
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![GAP_FILL; capacity],
            gap_start: 0,
            gap_end: capacity,
        }
    }

    /// 文字列からギャップバッファを作成
    ///
    /// 内容はギャップの前に置かれ、カーソルは末尾になる
    pub fn from_str(s: &str) -> Self {
        Self::from_str_with_capacity(s, DEFAULT_GAP_CAPACITY)
    }

    /// 初期容量を指定して文字列から作成
    ///
    /// 容量が足りない場合は、ギャップが1スロット以上残るまで倍々に広げる
    pub fn from_str_with_capacity(s: &str, capacity: usize) -> Self {
        let chars: Vec<char> = s.chars().collect();
        let mut total = capacity.max(1);
        while total <= chars.len() {
            total = total.saturating_mul(GAP_GROWTH_FACTOR);
        }

        let mut buffer = chars;
        let gap_start = buffer.len();
        buffer.resize(total, GAP_FILL);

        Self {
            buffer,
            gap_start,
            gap_end: total,
        }
    }

    /// 全体容量（スロット数）
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// 現在のギャップサイズを取得
    pub fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// ギャップの半開区間 `(gap_start, gap_end)`
    pub fn gap_range(&self) -> (usize, usize) {
        (self.gap_start, self.gap_end)
    }

    /// カーソル（ギャップ）を指定位置まで1スロットずつ移動
    ///
    /// バッファの端に達した時点で止まる
    pub fn move_cursor(&mut self, pos: usize) {
        while self.gap_start < pos {
            if !self.step_right() {
                break;
            }
        }
        while self.gap_start > pos {
            if !self.step_left() {
                break;
            }
        }
        self.debug_check();
    }

    /// ギャップ直後の1文字をギャップの前へ移す
    fn step_right(&mut self) -> bool {
        if self.gap_end >= self.buffer.len() {
            return false;
        }
        self.buffer[self.gap_start] = self.buffer[self.gap_end];
        self.gap_start += 1;
        self.gap_end += 1;
        true
    }

    /// ギャップ直前の1文字をギャップの後ろへ移す
    fn step_left(&mut self) -> bool {
        if self.gap_start == 0 {
            return false;
        }
        self.gap_start -= 1;
        self.gap_end -= 1;
        self.buffer[self.gap_end] = self.buffer[self.gap_start];
        true
    }

    /// カーソル位置に1文字挿入
    pub fn insert_char_at_cursor(&mut self, ch: char) {
        if self.gap_start == self.gap_end {
            self.grow();
        }
        self.buffer[self.gap_start] = ch;
        self.gap_start += 1;
        self.debug_check();
    }

    /// カーソル直前の1文字を削除（Backspace）
    ///
    /// カーソルが先頭にある場合は何もせず `false` を返す
    pub fn delete_char_at_cursor(&mut self) -> bool {
        if self.gap_start == 0 {
            return false;
        }
        self.gap_start -= 1;
        self.buffer[self.gap_start] = GAP_FILL;
        self.debug_check();
        true
    }

    /// 容量を倍にし、ギャップ前後の内容をそのまま保つ
    fn grow(&mut self) {
        let old_capacity = self.buffer.len();
        let new_capacity = old_capacity.saturating_mul(GAP_GROWTH_FACTOR).max(1);
        let suffix_len = old_capacity - self.gap_end;

        let mut new_buffer = vec![GAP_FILL; new_capacity];
        new_buffer[..self.gap_start].copy_from_slice(&self.buffer[..self.gap_start]);
        let new_gap_end = new_capacity - suffix_len;
        new_buffer[new_gap_end..].copy_from_slice(&self.buffer[self.gap_end..]);

        log::trace!(
            "gap buffer grown from {} to {} slots",
            old_capacity,
            new_capacity
        );

        self.buffer = new_buffer;
        self.gap_end = new_gap_end;
    }

    /// 構造不変条件を検証
    pub fn check_invariants(&self) -> bool {
        self.gap_start <= self.gap_end && self.gap_end <= self.buffer.len()
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariants(),
            "gap bounds broken: start={} end={} capacity={}",
            self.gap_start,
            self.gap_end,
            self.buffer.len()
        );
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer for GapBuffer {
    fn cursor(&self) -> usize {
        self.gap_start
    }

    fn move_cursor(&mut self, pos: usize) {
        GapBuffer::move_cursor(self, pos);
    }

    fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            self.insert_char_at_cursor(ch);
        }
        Ok(())
    }

    fn delete_at_cursor(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            if !self.delete_char_at_cursor() {
                break;
            }
        }
        Ok(())
    }

    fn text(&self) -> String {
        self.buffer[..self.gap_start]
            .iter()
            .chain(self.buffer[self.gap_end..].iter())
            .collect()
    }

    fn len(&self) -> usize {
        self.buffer.len() - self.gap_len()
    }
}
