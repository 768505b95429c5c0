//! 3表現の公開API比較プロパティテスト
//!
//! 任意の編集列を文字列モデルと並べて流し、ギャップバッファ・ピーステーブル・ロープが
//! 各手順の後で同じテキストと長さを持つことを確かめる。

use proptest::test_runner::Config as ProptestConfig;
use proptest::{prelude::*, prop_oneof};
use textcore::{CoreConfig, Document, GapBuffer, PieceTable, Rope, TextBuffer};

#[derive(Debug, Clone)]
enum Operation {
    Insert { pos: usize, text: String },
    Delete { pos: usize, count: usize },
}

fn small_unicode_string() -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<char>(), 0..48)
        .prop_map(|chars| chars.into_iter().collect::<String>())
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let insert = (0u16..128u16, proptest::collection::vec(any::<char>(), 0..6)).prop_map(
        |(pos, chars)| Operation::Insert {
            pos: pos as usize,
            text: chars.into_iter().collect(),
        },
    );
    let delete = (0u16..128u16, 0u8..8u8).prop_map(|(pos, count)| Operation::Delete {
        pos: pos as usize,
        count: count as usize,
    });

    prop_oneof![insert, delete]
}

fn char_to_byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

fn small_config() -> CoreConfig {
    CoreConfig {
        gap_capacity: 2,
        rope_leaf_size: 4,
        ..CoreConfig::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn representations_match_string_model(
        initial in small_unicode_string(),
        ops in proptest::collection::vec(operation_strategy(), 0..24)
    ) {
        let mut gap = GapBuffer::from_str_with_capacity(&initial, 2);
        let mut table = PieceTable::from_str(&initial);
        let mut rope = Rope::with_leaf_size(&initial, 4);
        let mut model = initial.clone();

        for op in ops {
            let len = model.chars().count();
            match op {
                Operation::Insert { pos, text } => {
                    let pos = pos.min(len);
                    let buffers: [&mut dyn TextBuffer; 3] = [&mut gap, &mut table, &mut rope];
                    for buffer in buffers {
                        buffer.move_cursor(pos);
                        buffer.insert_at_cursor(&text).unwrap();
                    }
                    let byte_idx = char_to_byte_index(&model, pos);
                    model.insert_str(byte_idx, &text);
                }
                Operation::Delete { pos, count } => {
                    let pos = pos.min(len);
                    if count > pos {
                        continue;
                    }
                    let buffers: [&mut dyn TextBuffer; 3] = [&mut gap, &mut table, &mut rope];
                    for buffer in buffers {
                        buffer.move_cursor(pos);
                        buffer.delete_at_cursor(count).unwrap();
                    }
                    let start = char_to_byte_index(&model, pos - count);
                    let end = char_to_byte_index(&model, pos);
                    model.replace_range(start..end, "");
                }
            }

            let expected_len = model.chars().count();
            prop_assert_eq!(gap.text(), model.clone());
            prop_assert_eq!(table.text(), model.clone());
            prop_assert_eq!(rope.text(), model.clone());
            prop_assert_eq!(TextBuffer::len(&gap), expected_len);
            prop_assert_eq!(table.len(), expected_len);
            prop_assert_eq!(rope.len(), expected_len);
            prop_assert!(gap.check_invariants());
            prop_assert!(table.check_invariants());
            prop_assert!(rope.check_invariants());
        }
    }

    #[test]
    fn undo_all_restores_initial_and_redo_all_restores_final(
        initial in small_unicode_string(),
        ops in proptest::collection::vec(operation_strategy(), 1..24)
    ) {
        let mut doc = Document::new(&initial, &small_config());
        for op in ops {
            match op {
                Operation::Insert { pos, text } => doc.insert(pos, &text).unwrap(),
                Operation::Delete { pos, count } => {
                    let _ = doc.delete(pos, count);
                }
            }
            prop_assert!(doc.is_consistent());
        }

        let edited = doc.text();
        while doc.undo() {
            prop_assert!(doc.is_consistent());
        }
        prop_assert_eq!(doc.text(), initial);

        while doc.redo() {
            prop_assert!(doc.is_consistent());
        }
        prop_assert_eq!(doc.text(), edited);
    }

    #[test]
    fn single_edit_undo_redo_restores_text_and_cursor(
        initial in small_unicode_string(),
        pos in 0usize..64,
        text in proptest::collection::vec(any::<char>(), 1..6),
        count in 1usize..8,
        is_insert in any::<bool>()
    ) {
        let mut table = PieceTable::from_str(&initial);
        let pos = pos.min(table.len());
        table.move_cursor(pos);
        let before_text = table.text();
        let before_cursor = table.cursor();

        if is_insert {
            let text: String = text.into_iter().collect();
            table.insert_at_cursor(&text);
        } else {
            prop_assume!(count <= pos);
            table.delete_at_cursor(count).unwrap();
        }
        let after_text = table.text();
        let after_cursor = table.cursor();

        prop_assert!(table.undo());
        prop_assert_eq!(table.text(), before_text);
        prop_assert_eq!(table.cursor(), before_cursor);
        prop_assert!(table.check_invariants());

        prop_assert!(table.redo());
        prop_assert_eq!(table.text(), after_text);
        prop_assert_eq!(table.cursor(), after_cursor);
        prop_assert!(table.check_invariants());
    }

    #[test]
    fn rope_substring_matches_text_slice(
        text in small_unicode_string(),
        start in 0usize..64,
        end in 0usize..64
    ) {
        let rope = Rope::with_leaf_size(&text, 3);
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let expected: String = text.chars().skip(lo).take(hi.saturating_sub(lo)).collect();
        prop_assert_eq!(rope.substring(start, end), expected);
    }
}
