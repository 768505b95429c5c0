//! ロープ実装
//!
//! テキスト片を葉に持つ二分木。挿入・削除は分割（split）と連結（concat）の組み合わせで行い、
//! 各ノードは子を排他的に所有する。分割・連結は変更する経路上に新しいノードを作るので、
//! 2つの木が同じ部分木を共有することはない。
//!
//! 連結時に AVL 風の結合を行い、兄弟の高さの差を常に1以内に保つ。

use std::cmp::Ordering;

use crate::buffer::TextBuffer;
use crate::config::DEFAULT_ROPE_LEAF_SIZE;
use crate::error::Result;

type Link = Option<Box<Node>>;

/// ロープのノード
#[derive(Debug, Clone)]
enum Node {
    /// テキスト片（最大葉サイズ以下、空ではない）
    Leaf { text: String, chars: usize },
    /// 子の所有と左部分木長のキャッシュのみを持つ
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        left_len: usize,
        len: usize,
        height: usize,
    },
}

impl Node {
    fn leaf(text: String) -> Box<Node> {
        let chars = text.chars().count();
        Box::new(Node::Leaf { text, chars })
    }

    /// 新しい内部ノード。キャッシュは常に子から再計算する
    fn internal(left: Box<Node>, right: Box<Node>) -> Box<Node> {
        let left_len = left.len();
        let len = left_len + right.len();
        let height = 1 + left.height().max(right.height());
        Box::new(Node::Internal {
            left,
            right,
            left_len,
            len,
            height,
        })
    }

    fn len(&self) -> usize {
        match self {
            Node::Leaf { chars, .. } => *chars,
            Node::Internal { len, .. } => *len,
        }
    }

    fn height(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { height, .. } => *height,
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn collect(&self, out: &mut String) {
        match self {
            Node::Leaf { text, .. } => out.push_str(text),
            Node::Internal { left, right, .. } => {
                left.collect(out);
                right.collect(out);
            }
        }
    }

    /// 部分木内の `[start, end)` を書き出す
    fn collect_range(&self, start: usize, end: usize, out: &mut String) {
        if start >= end {
            return;
        }
        match self {
            Node::Leaf { text, .. } => out.extend(text.chars().skip(start).take(end - start)),
            Node::Internal {
                left,
                right,
                left_len,
                ..
            } => {
                if start < *left_len {
                    left.collect_range(start, end.min(*left_len), out);
                }
                if end > *left_len {
                    right.collect_range(start.saturating_sub(*left_len), end - left_len, out);
                }
            }
        }
    }

    fn is_valid(&self, leaf_size: usize) -> bool {
        match self {
            Node::Leaf { text, chars } => {
                *chars > 0 && *chars <= leaf_size && text.chars().count() == *chars
            }
            Node::Internal {
                left,
                right,
                left_len,
                len,
                height,
            } => {
                let (lh, rh) = (left.height(), right.height());
                *left_len == left.len()
                    && *len == left.len() + right.len()
                    && *height == 1 + lh.max(rh)
                    && lh.abs_diff(rh) <= 1
                    && left.is_valid(leaf_size)
                    && right.is_valid(leaf_size)
            }
        }
    }
}

/// 2つの木を連結する。片方が空ならもう片方をそのまま返す
fn concat(left: Link, right: Link) -> Link {
    match (left, right) {
        (None, other) | (other, None) => other,
        (Some(left), Some(right)) => Some(join(left, right)),
    }
}

/// 高さの差を吸収しながら連結する
///
/// 高い側の内側の枝を降りていき、同程度の高さになった所で新しいノードを作る
fn join(left: Box<Node>, right: Box<Node>) -> Box<Node> {
    let (lh, rh) = (left.height(), right.height());
    if lh > rh + 1 {
        match *left {
            Node::Internal {
                left: outer,
                right: inner,
                ..
            } => balance(outer, join(inner, right)),
            leaf => Node::internal(Box::new(leaf), right),
        }
    } else if rh > lh + 1 {
        match *right {
            Node::Internal {
                left: inner,
                right: outer,
                ..
            } => balance(join(left, inner), outer),
            leaf => Node::internal(left, Box::new(leaf)),
        }
    } else {
        Node::internal(left, right)
    }
}

/// 高さの差が2になった場合に回転して内部ノードを作る
fn balance(left: Box<Node>, right: Box<Node>) -> Box<Node> {
    let (lh, rh) = (left.height(), right.height());
    if lh > rh + 1 {
        match *left {
            Node::Internal {
                left: ll, right: lr, ..
            } => {
                if ll.height() >= lr.height() {
                    Node::internal(ll, Node::internal(lr, right))
                } else {
                    match *lr {
                        Node::Internal {
                            left: lrl,
                            right: lrr,
                            ..
                        } => Node::internal(Node::internal(ll, lrl), Node::internal(lrr, right)),
                        leaf => Node::internal(Node::internal(ll, Box::new(leaf)), right),
                    }
                }
            }
            leaf => Node::internal(Box::new(leaf), right),
        }
    } else if rh > lh + 1 {
        match *right {
            Node::Internal {
                left: rl, right: rr, ..
            } => {
                if rr.height() >= rl.height() {
                    Node::internal(Node::internal(left, rl), rr)
                } else {
                    match *rl {
                        Node::Internal {
                            left: rll,
                            right: rlr,
                            ..
                        } => Node::internal(Node::internal(left, rll), Node::internal(rlr, rr)),
                        leaf => Node::internal(left, Node::internal(Box::new(leaf), rr)),
                    }
                }
            }
            leaf => Node::internal(left, Box::new(leaf)),
        }
    } else {
        Node::internal(left, right)
    }
}

/// 部分木を相対位置 `pos` で2つに分割する
fn split(node: Box<Node>, pos: usize) -> (Link, Link) {
    if pos == 0 {
        return (None, Some(node));
    }
    if pos >= node.len() {
        return (Some(node), None);
    }

    match *node {
        Node::Leaf { mut text, .. } => {
            let byte = byte_offset(&text, pos);
            let tail = text.split_off(byte);
            (Some(Node::leaf(text)), Some(Node::leaf(tail)))
        }
        Node::Internal {
            left,
            right,
            left_len,
            ..
        } => match pos.cmp(&left_len) {
            Ordering::Less => {
                let (head, rest) = split(left, pos);
                (head, concat(rest, Some(right)))
            }
            Ordering::Equal => (Some(left), Some(right)),
            Ordering::Greater => {
                let (rest, tail) = split(right, pos - left_len);
                (concat(Some(left), rest), tail)
            }
        },
    }
}

/// 文字位置をバイト位置に変換
fn byte_offset(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map_or(text.len(), |(idx, _)| idx)
}

/// `leaf_size` 文字ごとに区切る
fn chunk_str(text: &str, leaf_size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % leaf_size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// 区切った断片から高さの揃った木を作る
fn build_balanced(chunks: &[&str]) -> Link {
    match chunks {
        [] => None,
        [single] => Some(Node::leaf((*single).to_string())),
        _ => {
            let (left, right) = chunks.split_at(chunks.len() / 2);
            concat(build_balanced(left), build_balanced(right))
        }
    }
}

/// ロープ本体
#[derive(Debug, Clone)]
pub struct Rope {
    root: Link,
    cursor: usize,
    leaf_size: usize,
}

impl Rope {
    /// 空のロープを作成
    pub fn new() -> Self {
        Self::with_leaf_size("", DEFAULT_ROPE_LEAF_SIZE)
    }

    /// 文字列から作成（カーソルは末尾）
    pub fn from_str(text: &str) -> Self {
        Self::with_leaf_size(text, DEFAULT_ROPE_LEAF_SIZE)
    }

    /// 葉の最大文字数を指定して作成（最低1文字）
    pub fn with_leaf_size(text: &str, leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        let root = build_balanced(&chunk_str(text, leaf_size));
        let cursor = root.as_ref().map_or(0, |node| node.len());
        Self {
            root,
            cursor,
            leaf_size,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// カーソルを `[0, len]` にクランプして移動
    pub fn move_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.len());
    }

    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.len())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// 木の高さ（空なら0、葉だけなら1）
    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.height())
    }

    pub fn leaf_count(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.leaf_count())
    }

    /// カーソル位置で分割し、新しい葉を挟んで連結し直す
    pub fn insert_at_cursor(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let chunks = chunk_str(text, self.leaf_size);
        let inserted: usize = text.chars().count();
        let middle = build_balanced(&chunks);

        let (left, right) = match self.root.take() {
            Some(root) => split(root, self.cursor),
            None => (None, None),
        };
        self.root = concat(concat(left, middle), right);
        self.cursor += inserted;

        log::trace!(
            "rope insert {} chars in {} leaves, height {}",
            inserted,
            chunks.len(),
            self.height()
        );
        self.debug_check();
    }

    /// カーソル直前の `count` 文字を削除
    ///
    /// `count` が0またはカーソル位置を超える場合は何もしない
    pub fn delete_at_cursor(&mut self, count: usize) {
        if count == 0 || count > self.cursor {
            return;
        }
        let Some(root) = self.root.take() else {
            return;
        };

        let start = self.cursor - count;
        let (left, rest) = split(root, start);
        let right = match rest {
            Some(rest) => split(rest, count).1,
            None => None,
        };
        self.root = concat(left, right);
        self.cursor = start;

        log::trace!("rope delete {} chars at {}", count, start);
        self.debug_check();
    }

    /// 全テキストを中間順走査で再構築
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.len());
        if let Some(root) = &self.root {
            root.collect(&mut out);
        }
        out
    }

    /// `[start, end)` を取り出す（範囲外はクランプ、逆順は入れ替え）
    pub fn substring(&self, start: usize, end: usize) -> String {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let end = end.min(self.len());
        let mut out = String::new();
        if let Some(root) = &self.root {
            root.collect_range(start, end, &mut out);
        }
        out
    }

    /// 構造不変条件を検証
    ///
    /// キャッシュした左部分木長・全長・高さが子からの再計算と一致し、
    /// 兄弟の高さの差が1以内で、葉が空でなく最大葉サイズ以下であること
    pub fn check_invariants(&self) -> bool {
        let tree_ok = self
            .root
            .as_ref()
            .map_or(true, |node| node.is_valid(self.leaf_size));
        tree_ok && self.cursor <= self.len()
    }

    fn debug_check(&self) {
        debug_assert!(self.check_invariants(), "rope invariants broken");
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer for Rope {
    fn cursor(&self) -> usize {
        self.cursor
    }

    fn move_cursor(&mut self, pos: usize) {
        Rope::move_cursor(self, pos);
    }

    fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        Rope::insert_at_cursor(self, text);
        Ok(())
    }

    fn delete_at_cursor(&mut self, count: usize) -> Result<()> {
        Rope::delete_at_cursor(self, count);
        Ok(())
    }

    fn text(&self) -> String {
        Rope::text(self)
    }

    fn len(&self) -> usize {
        Rope::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rope() {
        let rope = Rope::new();
        assert!(rope.is_empty());
        assert_eq!(rope.len(), 0);
        assert_eq!(rope.height(), 0);
        assert_eq!(rope.text(), "");
    }

    #[test]
    fn test_insert_into_empty() {
        let mut rope = Rope::new();
        rope.insert_at_cursor("abc");
        assert_eq!(rope.text(), "abc");
        assert_eq!(rope.cursor(), 3);
        assert_eq!(rope.leaf_count(), 1);
    }

    #[test]
    fn test_abcdef_scenario() {
        let mut rope = Rope::from_str("abcdef");
        rope.move_cursor(3);
        rope.insert_at_cursor("XYZ");
        assert_eq!(rope.text(), "abcXYZdef");
        rope.move_cursor(9);
        rope.delete_at_cursor(3);
        assert_eq!(rope.text(), "abcXYZ");
        assert_eq!(rope.cursor(), 6);
    }

    #[test]
    fn test_construction_chunks_at_leaf_size() {
        let rope = Rope::with_leaf_size("abcdefghij", 3);
        assert_eq!(rope.leaf_count(), 4);
        assert_eq!(rope.text(), "abcdefghij");
        assert!(rope.check_invariants());
    }

    #[test]
    fn test_long_insert_is_chunked() {
        let mut rope = Rope::with_leaf_size("<>", 4);
        rope.move_cursor(1);
        let long = "0123456789abcdef!";
        rope.insert_at_cursor(long);
        assert_eq!(rope.text(), format!("<{}>", long));
        assert_eq!(rope.cursor(), 1 + long.len());
        assert!(rope.check_invariants());
        assert!(rope.leaf_count() >= 5);
    }

    #[test]
    fn test_delete_noops() {
        let mut rope = Rope::from_str("abc");
        rope.move_cursor(2);
        rope.delete_at_cursor(0);
        rope.delete_at_cursor(3);
        assert_eq!(rope.text(), "abc");
        assert_eq!(rope.cursor(), 2);
    }

    #[test]
    fn test_delete_everything() {
        let mut rope = Rope::with_leaf_size("hello world", 2);
        rope.delete_at_cursor(11);
        assert!(rope.is_empty());
        assert_eq!(rope.text(), "");
        rope.insert_at_cursor("x");
        assert_eq!(rope.text(), "x");
    }

    #[test]
    fn test_typing_keeps_tree_balanced() {
        let mut rope = Rope::with_leaf_size("", 4);
        for i in 0..2048 {
            let ch = char::from(b'a' + (i % 26) as u8);
            rope.insert_at_cursor(&ch.to_string());
        }
        assert_eq!(rope.len(), 2048);
        // 2048 leaves: a balanced tree stays logarithmic
        assert!(rope.height() <= 24, "height {}", rope.height());
        assert!(rope.check_invariants());
    }

    #[test]
    fn test_front_insertions_stay_balanced() {
        let mut rope = Rope::with_leaf_size("", 8);
        for _ in 0..1000 {
            rope.move_cursor(0);
            rope.insert_at_cursor("ab");
        }
        assert_eq!(rope.len(), 2000);
        assert!(rope.height() <= 24, "height {}", rope.height());
    }

    #[test]
    fn test_substring() {
        let rope = Rope::with_leaf_size("Hello, beautiful world!", 4);
        assert_eq!(rope.substring(7, 16), "beautiful");
        assert_eq!(rope.substring(16, 7), "beautiful");
        assert_eq!(rope.substring(17, 100), "world!");
        assert_eq!(rope.substring(40, 50), "");
    }

    #[test]
    fn test_multibyte_split() {
        let mut rope = Rope::with_leaf_size("日本語のテキスト", 3);
        rope.move_cursor(3);
        rope.insert_at_cursor("の");
        assert_eq!(rope.text(), "日本語ののテキスト");
        rope.delete_at_cursor(1);
        assert_eq!(rope.text(), "日本語のテキスト");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut rope = Rope::from_str("shared");
        let snapshot = rope.clone();
        rope.move_cursor(0);
        rope.insert_at_cursor("un");
        assert_eq!(rope.text(), "unshared");
        assert_eq!(snapshot.text(), "shared");
    }
}
