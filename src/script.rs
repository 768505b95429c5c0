//! 編集スクリプト
//!
//! JSON で記述した編集手順を [`Document`] に再生し、3表現が一致し続けるかを確かめる

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::document::{Document, Representation};
use crate::error::{Result, TextCoreError};

/// 1手順
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum EditStep {
    /// `pos` に `text` を挿入
    Insert { pos: usize, text: String },
    /// `pos` の直前 `count` 文字を削除
    Delete { pos: usize, count: usize },
    Undo,
    Redo,
    /// 同期サービスからの全文置き換え
    Remote { text: String },
}

/// 編集スクリプト
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditScript {
    #[serde(default)]
    pub initial: String,
    #[serde(default)]
    pub steps: Vec<EditStep>,
}

/// 表現ごとのテキストが食い違った地点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// 食い違いが見つかった手順（0ベース）
    pub step: usize,
    pub texts: Vec<(Representation, String)>,
}

/// 再生結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub text: String,
    pub steps_applied: usize,
    pub divergence: Option<Divergence>,
}

impl EditScript {
    /// JSON から読み込み
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 全手順を再生する。最初の食い違いで停止する
    ///
    /// # Errors
    /// 削除がカーソルより前へはみ出した場合は、その手順番号を添えた `Script` エラー
    pub fn replay(&self, config: &CoreConfig) -> Result<ReplayReport> {
        let mut doc = Document::new(&self.initial, config);

        for (index, step) in self.steps.iter().enumerate() {
            apply_step(&mut doc, step).map_err(|e| {
                TextCoreError::Script(format!("step {} ({:?}) failed: {}", index, step, e))
            })?;

            if !doc.is_consistent() {
                log::warn!("representations diverged at step {}", index);
                return Ok(ReplayReport {
                    text: doc.text(),
                    steps_applied: index + 1,
                    divergence: Some(Divergence {
                        step: index,
                        texts: doc.snapshots(),
                    }),
                });
            }
        }

        Ok(ReplayReport {
            text: doc.text(),
            steps_applied: self.steps.len(),
            divergence: None,
        })
    }
}

fn apply_step(doc: &mut Document, step: &EditStep) -> Result<()> {
    match step {
        EditStep::Insert { pos, text } => doc.insert(*pos, text),
        EditStep::Delete { pos, count } => doc.delete(*pos, *count),
        EditStep::Undo => {
            doc.undo();
            Ok(())
        }
        EditStep::Redo => {
            doc.redo();
            Ok(())
        }
        EditStep::Remote { text } => {
            doc.apply_remote_snapshot(text);
            Ok(())
        }
    }
}
