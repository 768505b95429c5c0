//! カーソル位置管理
//!
//! 表示ウィジェットが使う（行, 列）座標と、コアが使う絶対文字位置の相互変換

/// カーソル位置を表現する構造体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    /// 文字位置（0ベース）
    pub char_pos: usize,
    /// 行番号（0ベース）
    pub line: usize,
    /// 列番号（0ベース、文字単位）
    pub column: usize,
}

impl CursorPosition {
    /// 新しいカーソル位置を作成（原点に配置）
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定された位置にカーソルを作成
    pub fn at(char_pos: usize, line: usize, column: usize) -> Self {
        Self {
            char_pos,
            line,
            column,
        }
    }

    /// 絶対文字位置から行・列を求める（末尾でクランプ）
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut position = Self::new();
        for ch in text.chars().take(offset) {
            position.char_pos += 1;
            if ch == '\n' {
                position.line += 1;
                position.column = 0;
            } else {
                position.column += 1;
            }
        }
        position
    }

    /// 行・列から絶対文字位置を求める
    ///
    /// 行が範囲外なら最終行、列が行長を超えるなら行末にクランプする
    pub fn from_line_column(text: &str, line: usize, column: usize) -> Self {
        let mut offset = 0;
        let mut current_line = 0;
        let mut current_column = 0;

        for ch in text.chars() {
            if current_line == line && (current_column == column || ch == '\n') {
                break;
            }
            offset += 1;
            if ch == '\n' {
                current_line += 1;
                current_column = 0;
            } else {
                current_column += 1;
            }
        }

        Self::at(offset, current_line, current_column)
    }
}
