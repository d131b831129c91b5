//! 设计稿文档树模块
//!
//! 提供 Figma 文档节点的数据结构以及文档来源（Document Source）抽象。

mod figma;
mod source;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use figma::{extract_file_key, FigmaClient};
pub use source::{DocumentSource, VersionInfo};

/// Figma 文本节点的类型名
pub const TEXT_NODE_TYPE: &str = "TEXT";

/// 节点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 文本叶子节点（携带文本内容）
    Text,
    /// 容器节点（页面、框架、组等）
    Container,
}

/// 文档节点
///
/// 直接对应 Figma REST API 返回的节点 JSON，只保留差异计算需要的字段。
/// 节点树是不可变的值，遍历时只借用，不存在父节点回指。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// 节点ID（同一版本内唯一，跨版本稳定）
    pub id: String,
    /// Figma 节点类型（"TEXT"、"FRAME"、"CANVAS" 等）
    #[serde(rename = "type")]
    pub node_type: String,
    /// 文本内容（仅 TEXT 节点）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    /// 子节点（按设计稿中的顺序）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// 创建文本节点
    pub fn text(id: impl Into<String>, characters: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: TEXT_NODE_TYPE.to_string(),
            characters: Some(characters.into()),
            children: Vec::new(),
        }
    }

    /// 创建容器节点
    pub fn container(
        id: impl Into<String>,
        node_type: impl Into<String>,
        children: Vec<DocumentNode>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            characters: None,
            children,
        }
    }

    /// 节点种类
    pub fn kind(&self) -> NodeKind {
        if self.node_type == TEXT_NODE_TYPE {
            NodeKind::Text
        } else {
            NodeKind::Container
        }
    }

    /// 获取文本内容
    ///
    /// 非文本节点返回 `None`；文本节点缺少 `characters` 时视为空串。
    pub fn text_content(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Text => Some(self.characters.as_deref().unwrap_or("")),
            NodeKind::Container => None,
        }
    }

    /// 先序遍历整棵树（包括自身）
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// 构建 ID -> 节点 的索引
    ///
    /// ID 重复时后出现的节点覆盖先出现的。
    pub fn index_by_id(&self) -> HashMap<&str, &DocumentNode> {
        self.iter().map(|node| (node.id.as_str(), node)).collect()
    }
}

/// 先序遍历迭代器（显式栈，不递归）
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<&'a DocumentNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a DocumentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // 逆序压栈，保证先弹出第一个子节点
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> DocumentNode {
        DocumentNode::container(
            "0:0",
            "DOCUMENT",
            vec![
                DocumentNode::container(
                    "1:0",
                    "CANVAS",
                    vec![DocumentNode::text("1:1", "Hello"), DocumentNode::text("1:2", "World")],
                ),
                DocumentNode::text("2:1", "Footer"),
            ],
        )
    }

    #[test]
    fn test_pre_order() {
        let tree = sample_tree();
        let ids: Vec<&str> = tree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["0:0", "1:0", "1:1", "1:2", "2:1"]);
    }

    #[test]
    fn test_index_by_id() {
        let tree = sample_tree();
        let index = tree.index_by_id();
        assert_eq!(index.len(), 5);
        assert_eq!(index["1:2"].text_content(), Some("World"));
        assert_eq!(index["1:0"].kind(), NodeKind::Container);
    }

    #[test]
    fn test_text_content() {
        let node = DocumentNode {
            id: "3:1".to_string(),
            node_type: "TEXT".to_string(),
            characters: None,
            children: Vec::new(),
        };
        assert_eq!(node.text_content(), Some(""));

        let frame = DocumentNode::container("3:2", "FRAME", Vec::new());
        assert_eq!(frame.text_content(), None);
    }

    #[test]
    fn test_deserialize_figma_node() {
        let json = r#"{
            "id": "0:0",
            "name": "Document",
            "type": "DOCUMENT",
            "children": [
                {"id": "1:1", "name": "Title", "type": "TEXT", "characters": "Привет", "style": {}}
            ]
        }"#;

        let node: DocumentNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].text_content(), Some("Привет"));
    }
}
