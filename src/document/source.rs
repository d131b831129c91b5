use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DocumentNode;
use crate::utils::UpdaterError;

/// 设计稿版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// 版本ID
    pub id: String,
    /// 版本名称（手动保存的版本才有）
    pub label: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 作者
    pub author: String,
}

/// 文档来源 trait
///
/// # 职责
/// - 按版本拉取设计稿的节点树
/// - 列出设计稿的历史版本
///
/// 默认实现是 [`FigmaClient`](super::FigmaClient)，测试中可以替换为内存实现。
#[async_trait]
pub trait DocumentSource: Send + Sync + std::fmt::Debug {
    /// 获取指定版本的文档根节点
    ///
    /// # 错误
    /// - `InvalidUrl`: 链接中解析不出文件 key
    /// - `Upstream`: 服务端返回非成功状态
    /// - `InvalidResponse`: 响应中没有文档树
    async fn get_document(
        &self,
        snapshot_url: &str,
        version_id: &str,
    ) -> Result<DocumentNode, UpdaterError>;

    /// 获取版本列表
    ///
    /// # 返回
    /// 没有任何版本时返回 `None`
    async fn get_versions(&self, snapshot_url: &str)
        -> Result<Option<Vec<VersionInfo>>, UpdaterError>;
}
