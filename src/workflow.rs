//! 一次完整的更新流程
//!
//! 组合文档来源、差异计算、翻译目录、模糊匹配与文件改写。

use crate::catalog::TranslationCatalog;
use crate::config::LoadedConfig;
use crate::differ::{DiffBuilder, DiffPair};
use crate::document::{DocumentSource, FigmaClient, VersionInfo};
use crate::matcher::{ElizaClient, FuzzyMatcher};
use crate::rewriter::{FileRewriter, RewriteOutcome};
use crate::utils::UpdaterError;

/// 运行选项
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub figma_url: String,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    /// 只列出变更，不修改文件
    pub list_only: bool,
}

/// 运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// 未指定版本，返回可选版本（新的在前）
    Versions(Vec<VersionInfo>),
    /// 两个版本之间没有文本变更
    NoChanges,
    /// 只列出变更
    Preview(Vec<DiffPair>),
    /// 已尝试应用所有变更
    Applied {
        diffs: Vec<DiffPair>,
        outcomes: Vec<RewriteOutcome>,
    },
}

/// 应用结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub applied: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[RewriteOutcome]) -> Self {
        let applied = outcomes.iter().filter(|o| o.applied()).count();
        Self {
            total: outcomes.len(),
            applied,
            skipped: outcomes.len() - applied,
        }
    }
}

/// 更新流程
#[derive(Debug)]
pub struct UpdaterWorkflow {
    config: LoadedConfig,
    source: Box<dyn DocumentSource>,
    catalog: TranslationCatalog,
    matcher: Box<dyn FuzzyMatcher>,
}

impl UpdaterWorkflow {
    /// 使用 Figma 与 Eliza 客户端创建流程
    pub fn new(config: LoadedConfig) -> Self {
        let source = Box::new(FigmaClient::new(&config.figma));
        let matcher = Box::new(ElizaClient::new(config.eliza.clone()));
        let catalog = TranslationCatalog::new(config.catalog_path());

        if !matcher.is_enabled() {
            tracing::debug!("未配置 Eliza，模糊匹配已关闭");
        }

        Self {
            config,
            source,
            catalog,
            matcher,
        }
    }

    /// 使用自定义组件创建流程
    pub fn with_components(
        config: LoadedConfig,
        source: Box<dyn DocumentSource>,
        catalog: TranslationCatalog,
        matcher: Box<dyn FuzzyMatcher>,
    ) -> Self {
        Self {
            config,
            source,
            catalog,
            matcher,
        }
    }

    /// 获取设计稿的版本列表，按创建时间从新到旧排列
    ///
    /// # 返回
    /// 设计稿没有任何版本时返回 `None`
    pub async fn list_versions(&self, figma_url: &str) -> Result<Option<Vec<VersionInfo>>, UpdaterError> {
        let versions = self.source.get_versions(figma_url).await?;

        Ok(versions.map(|mut versions| {
            versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            versions
        }))
    }

    /// 计算两个版本之间的文本变更
    pub async fn build_diffs(
        &self,
        figma_url: &str,
        old_version: &str,
        new_version: &str,
    ) -> Result<Vec<DiffPair>, UpdaterError> {
        DiffBuilder::new(self.source.as_ref())
            .build_diffs(figma_url, old_version, new_version)
            .await
    }

    /// 把变更应用到项目文件
    pub async fn apply_diffs(&self, diffs: &[DiffPair]) -> Result<Vec<RewriteOutcome>, UpdaterError> {
        FileRewriter::new(&self.config.root_dir, &self.catalog, self.matcher.as_ref())
            .apply_diffs(diffs)
            .await
    }

    /// 执行完整流程
    ///
    /// # 错误
    /// 版本列表为空、拉取设计稿失败、翻译文件无法读取时返回错误
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport, UpdaterError> {
        let (Some(old_version), Some(new_version)) = (&options.old_version, &options.new_version) else {
            let versions = self
                .list_versions(&options.figma_url)
                .await?
                .ok_or(UpdaterError::MissingVersions)?;
            return Ok(RunReport::Versions(versions));
        };

        let diffs = self.build_diffs(&options.figma_url, old_version, new_version).await?;

        if diffs.is_empty() {
            tracing::info!("版本 {} 与 {} 之间没有文本变更", old_version, new_version);
            return Ok(RunReport::NoChanges);
        }

        tracing::info!("发现 {} 处文本变更", diffs.len());

        if options.list_only {
            return Ok(RunReport::Preview(diffs));
        }

        let outcomes = self.apply_diffs(&diffs).await?;
        let summary = RunSummary::from_outcomes(&outcomes);
        tracing::info!("已更新 {} 处，跳过 {} 处", summary.applied, summary.skipped);

        Ok(RunReport::Applied { diffs, outcomes })
    }
}
