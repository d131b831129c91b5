//! 模糊匹配模块
//!
//! 当翻译目录中找不到旧文本时，把目录分批交给外部文本匹配服务，
//! 由服务判断哪个键与旧文本只存在不影响含义的差异。
//!
//! - **chunking**: 按条目数与长度分批（纯函数）
//! - **prompt**: 提示词与请求体
//! - **eliza**: 基于 Eliza 聊天补全接口的默认实现

mod chunking;
mod eliza;
mod prompt;

use async_trait::async_trait;
use thiserror::Error;

pub use chunking::{
    chunk_translations, chunk_translations_with_limits, ChunkEntry, TranslationChunk,
    PROMPT_CHUNK_MAX_ENTRIES, PROMPT_CHUNK_MAX_LENGTH,
};
pub use eliza::{parse_completion, ElizaClient};
pub use prompt::{build_prompt, build_request_body, RESPONSE_SCHEMA_NAME};

/// 匹配服务的硬失败
///
/// 出现任何一种都会中止当前差异的模糊匹配，剩余批次不再请求。
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("服务返回 {status}: {body}")]
    Status { status: u16, body: String },

    #[error("响应体无法解析: {0}")]
    InvalidBody(String),

    #[error("响应中缺少补全内容")]
    MissingContent,

    #[error("补全内容不符合约定的结构: {0}")]
    Schema(String),

    #[error("无法构建提示词: {0}")]
    Prompt(#[source] serde_json::Error),
}

/// 模糊匹配服务 trait
///
/// # 职责
/// - 给定旧文本和一批翻译条目，返回被判定为同一文本的位置引用
/// - 空列表表示“没有匹配”，不是错误
#[async_trait]
pub trait FuzzyMatcher: Send + Sync + std::fmt::Debug {
    /// 服务是否可用（未配置时整个模糊匹配流程直接跳过）
    fn is_enabled(&self) -> bool;

    /// 在一批条目中查找与 `old_text` 匹配的键的全部位置
    async fn find_code_paths(
        &self,
        old_text: &str,
        chunk: &TranslationChunk<'_>,
    ) -> Result<Vec<String>, MatchError>;
}

/// 未配置匹配服务时使用的空实现
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMatcher;

#[async_trait]
impl FuzzyMatcher for DisabledMatcher {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn find_code_paths(
        &self,
        _old_text: &str,
        _chunk: &TranslationChunk<'_>,
    ) -> Result<Vec<String>, MatchError> {
        Ok(Vec::new())
    }
}
