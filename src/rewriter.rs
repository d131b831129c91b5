//! 源码文件改写
//!
//! 对每一处文本变更，按候选顺序尝试替换，第一个成功的候选即停止。
//! 单条变更的任何失败只记录在结果里，不影响后续变更。

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::catalog::{SourceLocation, TranslationCatalog};
use crate::differ::DiffPair;
use crate::matcher::FuzzyMatcher;
use crate::resolver::{Resolution, ResolutionCandidate, Resolver};
use crate::utils::UpdaterError;

/// 在文件中替换第一处 `search_text`
///
/// # 返回
/// 文件中不包含 `search_text` 时返回 `Ok(false)`，文件保持不变
///
/// # 错误
/// 读取或写入失败时返回 IO 错误
pub async fn replace_in_file(path: &Path, search_text: &str, new_text: &str) -> std::io::Result<bool> {
    let content = tokio::fs::read_to_string(path).await?;

    if !content.contains(search_text) {
        return Ok(false);
    }

    let updated = content.replacen(search_text, new_text, 1);
    tokio::fs::write(path, updated).await?;
    Ok(true)
}

/// 单个候选失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
    pub location: String,
    pub search_text: String,
    pub reason: String,
}

/// 单条变更的处理状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewriteStatus {
    /// 替换成功
    Applied {
        location: String,
        path: PathBuf,
        search_text: String,
    },
    /// 没有任何候选位置
    NoCandidates { reason: String },
    /// 所有候选都失败
    NotApplied {
        /// 尝试过的不同搜索文本（按首次尝试顺序）
        attempted_variants: Vec<String>,
        failures: Vec<CandidateFailure>,
    },
}

/// 单条变更的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    pub old_text: String,
    pub new_text: String,
    #[serde(flatten)]
    pub status: RewriteStatus,
}

impl RewriteOutcome {
    pub fn applied(&self) -> bool {
        matches!(self.status, RewriteStatus::Applied { .. })
    }

    /// 成功时使用的位置
    pub fn location(&self) -> Option<&str> {
        match &self.status {
            RewriteStatus::Applied { location, .. } => Some(location),
            _ => None,
        }
    }

    /// 失败时尝试过的搜索文本
    pub fn attempted_variants(&self) -> &[String] {
        match &self.status {
            RewriteStatus::NotApplied { attempted_variants, .. } => attempted_variants,
            _ => &[],
        }
    }

    /// 失败原因的可读描述（成功时为 `None`）
    pub fn failure_reason(&self) -> Option<String> {
        match &self.status {
            RewriteStatus::Applied { .. } => None,
            RewriteStatus::NoCandidates { reason } => Some(reason.clone()),
            RewriteStatus::NotApplied { failures, .. } => {
                if failures.is_empty() {
                    return Some("没有可尝试的候选位置".to_string());
                }

                let details: Vec<String> = failures
                    .iter()
                    .map(|f| format!("{} \"{}\": {}", f.location, f.search_text, f.reason))
                    .collect();
                Some(format!("所有候选位置都替换失败（{}）", details.join("; ")))
            }
        }
    }
}

/// 文件改写器
#[derive(Debug)]
pub struct FileRewriter<'a> {
    root_dir: &'a Path,
    catalog: &'a TranslationCatalog,
    matcher: &'a dyn FuzzyMatcher,
}

impl<'a> FileRewriter<'a> {
    /// 创建改写器
    ///
    /// # 参数
    /// * `root_dir` - 位置引用相对的项目根目录
    /// * `catalog` - 翻译目录
    /// * `matcher` - 模糊匹配服务
    pub fn new(root_dir: &'a Path, catalog: &'a TranslationCatalog, matcher: &'a dyn FuzzyMatcher) -> Self {
        Self {
            root_dir,
            catalog,
            matcher,
        }
    }

    /// 依次处理所有变更
    ///
    /// # 错误
    /// 只有翻译目录读取失败会中断整个过程；其余失败都记录在对应的结果里
    pub async fn apply_diffs(&self, diffs: &[DiffPair]) -> Result<Vec<RewriteOutcome>, UpdaterError> {
        let translations = self.catalog.read().await?;
        let resolver = Resolver::new(self.matcher);
        let mut outcomes = Vec::with_capacity(diffs.len());

        for pair in diffs {
            let resolution = resolver.resolve(&pair.old_text, translations).await;

            let status = match &resolution {
                Resolution::Unresolved(reason) => {
                    tracing::warn!("无法在翻译文件中找到字符串 \"{}\" 的位置: {}", pair.old_text, reason);
                    RewriteStatus::NoCandidates {
                        reason: reason.to_string(),
                    }
                }
                _ => self.apply_candidates(pair, resolution.candidates()).await,
            };

            outcomes.push(RewriteOutcome {
                old_text: pair.old_text.clone(),
                new_text: pair.new_text.clone(),
                status,
            });
        }

        Ok(outcomes)
    }

    async fn apply_candidates(&self, pair: &DiffPair, candidates: &[ResolutionCandidate]) -> RewriteStatus {
        let mut failures = Vec::new();

        for candidate in candidates {
            let path = SourceLocation::parse(&candidate.location).resolve(self.root_dir);

            match replace_in_file(&path, &candidate.search_text, &pair.new_text).await {
                Ok(true) => {
                    if candidate.search_text == pair.old_text {
                        tracing::info!(
                            "已更新文件 {:?}: \"{}\" -> \"{}\"",
                            path,
                            pair.old_text,
                            pair.new_text
                        );
                    } else {
                        tracing::info!(
                            "已更新文件 {:?}: \"{}\" -> \"{}\"（文件中匹配到 \"{}\"）",
                            path,
                            pair.old_text,
                            pair.new_text,
                            candidate.search_text
                        );
                    }

                    return RewriteStatus::Applied {
                        location: candidate.location.clone(),
                        path,
                        search_text: candidate.search_text.clone(),
                    };
                }
                Ok(false) => failures.push(CandidateFailure {
                    location: candidate.location.clone(),
                    search_text: candidate.search_text.clone(),
                    reason: "文件中没有该字符串".to_string(),
                }),
                Err(e) => {
                    tracing::warn!("更新文件 {:?} 失败: {}", path, e);
                    failures.push(CandidateFailure {
                        location: candidate.location.clone(),
                        search_text: candidate.search_text.clone(),
                        reason: format!("无法读取或写入文件: {}", e),
                    });
                }
            }
        }

        let mut attempted_variants: Vec<String> = Vec::new();
        for candidate in candidates {
            if !attempted_variants.contains(&candidate.search_text) {
                attempted_variants.push(candidate.search_text.clone());
            }
        }

        tracing::warn!("字符串 \"{}\" 没有在指定文件中找到", pair.old_text);

        RewriteStatus::NotApplied {
            attempted_variants,
            failures,
        }
    }
}
