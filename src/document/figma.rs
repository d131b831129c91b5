//! Figma REST API 客户端

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

use super::{DocumentNode, DocumentSource, VersionInfo};
use crate::config::FigmaConfig;
use crate::utils::{ensure_trailing_slash, UpdaterError};

const FILE_KEY_PATTERN: &str = r"figma\.com/(?:file|design)/([a-zA-Z0-9]+)";
const UNKNOWN_AUTHOR: &str = "Unknown author";
/// 单次请求超时（大型设计稿的文档树可能有几十 MB）
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

static FILE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FILE_KEY_PATTERN).expect("file key pattern must compile"));

/// 从 Figma 链接中提取文件 key
///
/// 支持 `https://www.figma.com/file/<key>/...` 与 `https://www.figma.com/design/<key>/...`
pub fn extract_file_key(url: &str) -> Result<String, UpdaterError> {
    FILE_KEY_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| UpdaterError::InvalidUrl(url.to_string()))
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUser {
    Name(String),
    Profile {
        #[serde(default)]
        handle: Option<String>,
    },
}

impl RawVersion {
    fn into_version_info(self) -> VersionInfo {
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let author = match self.user {
            Some(RawUser::Name(name)) => name,
            Some(RawUser::Profile { handle: Some(handle) }) => handle,
            _ => UNKNOWN_AUTHOR.to_string(),
        };

        VersionInfo {
            id: self.id,
            label: self.label.filter(|label| !label.is_empty()),
            created_at,
            author,
        }
    }
}

/// 解析 `GET /files/:key` 的响应体，取出文档根节点
pub(crate) fn parse_document(payload: Value) -> Result<DocumentNode, UpdaterError> {
    let document = match payload {
        Value::Object(mut map) => map.remove("document"),
        _ => None,
    }
    .ok_or_else(|| UpdaterError::InvalidResponse("响应中缺少 document 字段".to_string()))?;

    serde_json::from_value(document)
        .map_err(|e| UpdaterError::InvalidResponse(format!("无法解析文档树: {}", e)))
}

/// 解析 `GET /files/:key/versions` 的响应体
pub(crate) fn parse_versions(payload: Value) -> Result<Option<Vec<VersionInfo>>, UpdaterError> {
    let versions = match payload {
        Value::Object(mut map) => map.remove("versions"),
        _ => None,
    }
    .filter(Value::is_array)
    .ok_or_else(|| UpdaterError::InvalidResponse("响应中缺少 versions 数组".to_string()))?;

    let raw: Vec<RawVersion> = serde_json::from_value(versions)
        .map_err(|e| UpdaterError::InvalidResponse(format!("无法解析版本列表: {}", e)))?;

    if raw.is_empty() {
        return Ok(None);
    }

    Ok(Some(raw.into_iter().map(RawVersion::into_version_info).collect()))
}

/// Figma REST API 客户端
#[derive(Debug, Clone)]
pub struct FigmaClient {
    api_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl FigmaClient {
    /// 根据配置创建客户端
    pub fn new(config: &FigmaConfig) -> Self {
        Self {
            api_url: ensure_trailing_slash(&config.api_url),
            token: config.token.clone().filter(|token| !token.is_empty()),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// 发送 GET 请求并返回 JSON 响应体
    async fn request(
        &self,
        snapshot_url: &str,
        suffix: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, UpdaterError> {
        let file_key = extract_file_key(snapshot_url)?;
        let url = format!("{}{}{}", self.api_url, file_key, suffix);

        tracing::debug!("请求 Figma API: {}", url);

        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.header("X-FIGMA-TOKEN", token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(UpdaterError::Upstream {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpdaterError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DocumentSource for FigmaClient {
    async fn get_document(
        &self,
        snapshot_url: &str,
        version_id: &str,
    ) -> Result<DocumentNode, UpdaterError> {
        let payload = self
            .request(snapshot_url, "", &[("version", version_id)])
            .await?;
        parse_document(payload)
    }

    async fn get_versions(
        &self,
        snapshot_url: &str,
    ) -> Result<Option<Vec<VersionInfo>>, UpdaterError> {
        let payload = self.request(snapshot_url, "/versions", &[]).await?;
        parse_versions(payload)
    }
}
