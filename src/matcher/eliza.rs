use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::prompt::{build_prompt, build_request_body};
use super::{FuzzyMatcher, MatchError, TranslationChunk};
use crate::config::ElizaConfig;

/// 单批请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Deserialize)]
struct ElizaEnvelope {
    /// Eliza 网关把补全结果包在 `response` 里
    #[serde(default)]
    response: Option<ChatCompletion>,
    /// 兼容直接返回 OpenAI 格式的网关
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CodePathsReply {
    #[serde(rename = "codePaths")]
    code_paths: Vec<String>,
}

impl ElizaEnvelope {
    fn into_content(self) -> Option<String> {
        let choices = match self.response {
            Some(completion) => completion.choices,
            None => self.choices.unwrap_or_default(),
        };

        choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

/// 解析聊天补全响应体，取出位置引用
///
/// 位置引用会去掉首尾空白，空串被丢弃；结果为空表示没有匹配。
pub fn parse_completion(body: &str) -> Result<Vec<String>, MatchError> {
    let envelope: ElizaEnvelope =
        serde_json::from_str(body).map_err(|e| MatchError::InvalidBody(e.to_string()))?;

    let content = envelope.into_content().ok_or(MatchError::MissingContent)?;

    let reply: CodePathsReply =
        serde_json::from_str(&content).map_err(|e| MatchError::Schema(e.to_string()))?;

    Ok(reply
        .code_paths
        .into_iter()
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect())
}

/// Eliza 聊天补全接口客户端
///
/// 只有 endpoint、api key、model 全部配置时才启用。
#[derive(Debug, Clone)]
pub struct ElizaClient {
    options: Option<ElizaConfig>,
    http: reqwest::Client,
}

impl ElizaClient {
    pub fn new(options: Option<ElizaConfig>) -> Self {
        Self {
            options: options.filter(ElizaConfig::is_complete),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn send_prompt(&self, config: &ElizaConfig, prompt: &str) -> Result<Vec<String>, MatchError> {
        let body = build_request_body(&config.model, prompt);

        let response = self
            .http
            .post(&config.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("OAuth {}", config.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MatchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let text = response.text().await?;
        parse_completion(&text)
    }
}

#[async_trait]
impl FuzzyMatcher for ElizaClient {
    fn is_enabled(&self) -> bool {
        self.options.is_some()
    }

    async fn find_code_paths(
        &self,
        old_text: &str,
        chunk: &TranslationChunk<'_>,
    ) -> Result<Vec<String>, MatchError> {
        let Some(config) = &self.options else {
            return Ok(Vec::new());
        };

        let prompt = build_prompt(old_text, chunk).map_err(MatchError::Prompt)?;
        self.send_prompt(config, &prompt).await
    }
}
