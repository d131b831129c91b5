//! 源码位置解析
//!
//! 把一段旧文本解析为按优先级排列的候选替换位置：
//! 1. 翻译目录精确命中：每个位置一个候选，搜索文本就是旧文本
//! 2. 否则分批请求模糊匹配服务，把返回的位置映射回目录中的键，并按编辑距离过滤

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::catalog::TranslationsMap;
use crate::matcher::{chunk_translations, FuzzyMatcher};
use crate::utils::preview;

/// 模糊匹配结果允许的最大编辑距离
pub const MAX_LEVENSHTEIN_DISTANCE: usize = 4;

/// 候选替换位置
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolutionCandidate {
    /// 位置引用（`path[:line]`）
    pub location: String,
    /// 要在文件中查找的文本
    pub search_text: String,
}

impl ResolutionCandidate {
    pub fn new(location: impl Into<String>, search_text: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            search_text: search_text.into(),
        }
    }
}

/// 无法解析出候选的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// 目录中没有该文本，且未配置模糊匹配服务
    MatcherDisabled,
    /// 目录中没有任何带位置的条目可供匹配
    EmptyCatalog,
    /// 所有批次都没有匹配（或匹配结果全部被编辑距离过滤）
    NoMatch,
    /// 匹配服务硬失败
    MatcherFailed(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::MatcherDisabled => write!(f, "翻译文件中没有该字符串，且未配置模糊匹配服务"),
            UnresolvedReason::EmptyCatalog => write!(f, "翻译文件中没有可供匹配的条目"),
            UnresolvedReason::NoMatch => write!(f, "模糊匹配服务没有找到对应的字符串"),
            UnresolvedReason::MatcherFailed(message) => write!(f, "模糊匹配服务请求失败: {}", message),
        }
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 翻译目录精确命中
    Exact(Vec<ResolutionCandidate>),
    /// 模糊匹配命中
    Fuzzy(Vec<ResolutionCandidate>),
    /// 没有候选
    Unresolved(UnresolvedReason),
}

impl Resolution {
    /// 按优先级排列的候选（未解析时为空）
    pub fn candidates(&self) -> &[ResolutionCandidate] {
        match self {
            Resolution::Exact(candidates) | Resolution::Fuzzy(candidates) => candidates,
            Resolution::Unresolved(_) => &[],
        }
    }
}

/// 判断模糊匹配出的文本是否足够接近旧文本
pub fn is_similar_enough(old_text: &str, search_text: &str) -> bool {
    search_text == old_text || strsim::levenshtein(old_text, search_text) <= MAX_LEVENSHTEIN_DISTANCE
}

/// 把服务返回的位置映射为候选
///
/// 每个位置对应目录中所有包含它的键；没有任何键包含时退回使用旧文本。
/// 结果按 (位置, 搜索文本) 去重，保持首次出现的顺序。
pub fn build_candidates(
    old_text: &str,
    suggested: &[String],
    translations: &TranslationsMap,
) -> Vec<ResolutionCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for location in suggested {
        let location = location.trim();

        if location.is_empty() {
            continue;
        }

        let mut matched = false;
        for text in translations.keys_with_location(location) {
            matched = true;
            let candidate = ResolutionCandidate::new(location, text);
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }

        if !matched {
            let candidate = ResolutionCandidate::new(location, old_text);
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// 位置解析器
#[derive(Debug)]
pub struct Resolver<'a> {
    matcher: &'a dyn FuzzyMatcher,
}

impl<'a> Resolver<'a> {
    pub fn new(matcher: &'a dyn FuzzyMatcher) -> Self {
        Self { matcher }
    }

    /// 解析一段旧文本的候选位置
    pub async fn resolve(&self, old_text: &str, translations: &TranslationsMap) -> Resolution {
        let known_locations = translations.locations(old_text);

        if !known_locations.is_empty() {
            return Resolution::Exact(
                known_locations
                    .into_iter()
                    .map(|location| ResolutionCandidate::new(location, old_text))
                    .collect(),
            );
        }

        self.resolve_fuzzy(old_text, translations).await
    }

    /// 分批请求模糊匹配服务
    ///
    /// 第一个过滤后非空的批次即为结果；任何一批硬失败都会立即放弃剩余批次。
    async fn resolve_fuzzy(&self, old_text: &str, translations: &TranslationsMap) -> Resolution {
        if !self.matcher.is_enabled() {
            return Resolution::Unresolved(UnresolvedReason::MatcherDisabled);
        }

        let chunks = chunk_translations(translations);

        if chunks.is_empty() {
            return Resolution::Unresolved(UnresolvedReason::EmptyCatalog);
        }

        let total = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            tracing::debug!(
                "模糊匹配 \"{}\": 第 {}/{} 批（{} 条）",
                preview(old_text, 50),
                i + 1,
                total,
                chunk.len()
            );

            let suggested = match self.matcher.find_code_paths(old_text, chunk).await {
                Ok(suggested) => suggested,
                Err(e) => {
                    tracing::error!("模糊匹配服务请求失败: {}", e);
                    return Resolution::Unresolved(UnresolvedReason::MatcherFailed(e.to_string()));
                }
            };

            if suggested.is_empty() {
                continue;
            }

            let candidates: Vec<ResolutionCandidate> = build_candidates(old_text, &suggested, translations)
                .into_iter()
                .filter(|candidate| is_similar_enough(old_text, &candidate.search_text))
                .collect();

            if candidates.is_empty() {
                tracing::debug!("第 {} 批的匹配结果与原文差异过大，已忽略", i + 1);
                continue;
            }

            let locations: Vec<&str> = candidates.iter().map(|c| c.location.as_str()).collect();
            tracing::info!(
                "模糊匹配服务建议的位置: {}。如果字符串没有自动更新，请手动修改。",
                locations.join(", ")
            );

            return Resolution::Fuzzy(candidates);
        }

        Resolution::Unresolved(UnresolvedReason::NoMatch)
    }
}
