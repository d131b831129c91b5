//! 版本差异计算
//!
//! 比较同一设计稿的两个版本，按节点ID对齐文本节点，输出去重后的 (旧文本, 新文本) 列表。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::document::{DocumentNode, DocumentSource};
use crate::utils::{normalize_text, UpdaterError};

/// 一处文本变更
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffPair {
    /// 旧版本中的文本
    pub old_text: String,
    /// 新版本中的文本
    pub new_text: String,
}

impl DiffPair {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }
}

/// 计算两棵文档树之间的文本差异
///
/// # 规则
/// - 按旧树的先序遍历顺序输出
/// - 只比较两边都是文本节点、且ID相同的节点
/// - 文本会先去掉首尾空白，空文本忽略
/// - 同一段旧文本只输出第一次出现的变更
pub fn diff_trees(old_tree: &DocumentNode, new_tree: &DocumentNode) -> Vec<DiffPair> {
    let new_index = new_tree.index_by_id();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut changes = Vec::new();

    for old_node in old_tree.iter() {
        let Some(old_text) = old_node.text_content().and_then(normalize_text) else {
            continue;
        };

        let new_text = new_index
            .get(old_node.id.as_str())
            .and_then(|node| node.text_content())
            .and_then(normalize_text);

        if let Some(new_text) = new_text {
            if old_text != new_text && seen.insert(old_text) {
                changes.push(DiffPair::new(old_text, new_text));
            }
        }
    }

    changes
}

/// 差异构建器：拉取两个版本并计算差异
#[derive(Debug)]
pub struct DiffBuilder<'a> {
    source: &'a dyn DocumentSource,
}

impl<'a> DiffBuilder<'a> {
    pub fn new(source: &'a dyn DocumentSource) -> Self {
        Self { source }
    }

    /// 并发拉取新旧两个版本，然后计算差异
    pub async fn build_diffs(
        &self,
        snapshot_url: &str,
        old_version: &str,
        new_version: &str,
    ) -> Result<Vec<DiffPair>, UpdaterError> {
        let (old_tree, new_tree) = futures::try_join!(
            self.source.get_document(snapshot_url, old_version),
            self.source.get_document(snapshot_url, new_version),
        )?;

        let changes = diff_trees(&old_tree, &new_tree);
        tracing::debug!(
            "版本 {} -> {} 共发现 {} 处文本变更",
            old_version,
            new_version,
            changes.len()
        );

        Ok(changes)
    }
}
