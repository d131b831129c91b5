use thiserror::Error;
use std::path::PathBuf;

/// 自定义错误类型
///
/// 这里只收录会中断整个流程的错误；单条差异的失败记录在 `RewriteOutcome` 中。
#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Figma 链接格式无效: {0}")]
    InvalidUrl(String),

    #[error("Figma API 返回错误: {status} {message}")]
    Upstream { status: u16, message: String },

    #[error("Figma API 响应格式无效: {0}")]
    InvalidResponse(String),

    #[error("未找到设计稿的版本")]
    MissingVersions,

    #[error("配置错误: {0}")]
    Config(String),

    #[error("无法读取翻译文件 {path:?}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 规范化节点文本
///
/// 去掉首尾空白；空白文本返回 `None`，差异计算会忽略这类节点。
pub fn normalize_text(text: &str) -> Option<&str> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    Some(text)
}

/// 截断过长文本，用于日志输出
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 确保 URL 以 `/` 结尾，便于直接拼接路径段
pub fn ensure_trailing_slash(input: &str) -> String {
    if input.ends_with('/') {
        input.to_string()
    } else {
        format!("{}/", input)
    }
}
