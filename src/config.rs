//! 配置加载
//!
//! 配置来源（优先级从高到低）：
//! 1. 工作目录下的 `texts-updater.config.json`
//! 2. 环境变量（`FIGMA_API_URL`、`FIGMA_TOKEN`、`ELIZA_ENDPOINT`、`ELIZA_TOKEN`、`ELIZA_MODEL`）
//! 3. 内置默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::utils::UpdaterError;

pub const DEFAULT_CONFIG_FILE: &str = "texts-updater.config.json";
pub const DEFAULT_TRANSLATIONS_PATH: &str = "src/locales/ru.po";
pub const DEFAULT_FIGMA_API_URL: &str = "https://api.figma.com/v1/files/";

/// Figma API 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaConfig {
    /// REST API 基础地址（可以指向代理）
    pub api_url: String,
    /// 个人访问令牌
    pub token: Option<String>,
}

/// 翻译文件配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationsConfig {
    /// PO 文件路径，相对于项目根目录
    pub path: String,
}

/// Eliza 匹配服务配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElizaConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl ElizaConfig {
    /// 三项都不为空时才算完整
    pub fn is_complete(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && !self.model.trim().is_empty()
    }
}

/// 配置文件内容（所有字段可选）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserConfig {
    #[serde(default)]
    figma: Option<UserFigmaConfig>,
    #[serde(default)]
    translations: Option<UserTranslationsConfig>,
    #[serde(default)]
    eliza: Option<UserElizaConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserFigmaConfig {
    api_url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UserTranslationsConfig {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserElizaConfig {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
}

/// 加载完成的配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub figma: FigmaConfig,
    pub translations: TranslationsConfig,
    pub eliza: Option<ElizaConfig>,
    /// 替换字符串的项目根目录
    pub root_dir: PathBuf,
    /// 实际读取到的配置文件
    pub config_path: Option<PathBuf>,
}

impl LoadedConfig {
    /// 使用默认值构建配置（不读取文件与环境变量）
    pub fn with_root(root_dir: PathBuf) -> Self {
        Self {
            figma: FigmaConfig {
                api_url: DEFAULT_FIGMA_API_URL.to_string(),
                token: None,
            },
            translations: TranslationsConfig {
                path: DEFAULT_TRANSLATIONS_PATH.to_string(),
            },
            eliza: None,
            root_dir,
            config_path: None,
        }
    }

    /// PO 文件的完整路径
    pub fn catalog_path(&self) -> PathBuf {
        self.root_dir.join(&self.translations.path)
    }
}

/// 配置加载选项
#[derive(Debug, Clone, Default)]
pub struct LoadConfigOptions {
    /// 查找配置文件的目录，默认当前目录
    pub cwd: Option<PathBuf>,
    /// 配置文件名，默认 `texts-updater.config.json`
    pub config_file: Option<PathBuf>,
    /// 替换字符串的目录（相对于 cwd）
    pub target_root: Option<PathBuf>,
}

/// 从文件与进程环境变量加载配置
pub fn load_config(options: &LoadConfigOptions) -> Result<LoadedConfig, UpdaterError> {
    load_config_with_env(options, |key| std::env::var(key).ok())
}

/// 从文件与给定的环境变量来源加载配置
pub fn load_config_with_env<F>(options: &LoadConfigOptions, env: F) -> Result<LoadedConfig, UpdaterError>
where
    F: Fn(&str) -> Option<String>,
{
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir()?,
    };

    let config_path = cwd.join(
        options
            .config_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)),
    );
    let (user_config, found) = match read_user_config(&config_path)? {
        Some(user_config) => (user_config, true),
        None => (UserConfig::default(), false),
    };
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    let user_figma = user_config.figma.unwrap_or_default();
    let figma = FigmaConfig {
        api_url: user_figma
            .api_url
            .or_else(|| lookup("FIGMA_API_URL"))
            .unwrap_or_else(|| DEFAULT_FIGMA_API_URL.to_string()),
        token: user_figma
            .token
            .filter(|token| !token.is_empty())
            .or_else(|| lookup("FIGMA_TOKEN")),
    };

    let translations = TranslationsConfig {
        path: user_config
            .translations
            .and_then(|t| t.path)
            .unwrap_or_else(|| DEFAULT_TRANSLATIONS_PATH.to_string()),
    };

    let user_eliza = user_config.eliza.unwrap_or_default();
    let eliza = ElizaConfig {
        endpoint: user_eliza.endpoint.or_else(|| lookup("ELIZA_ENDPOINT")).unwrap_or_default(),
        api_key: user_eliza.api_key.or_else(|| lookup("ELIZA_TOKEN")).unwrap_or_default(),
        model: user_eliza.model.or_else(|| lookup("ELIZA_MODEL")).unwrap_or_default(),
    };
    let eliza = if eliza.endpoint.is_empty() && eliza.api_key.is_empty() && eliza.model.is_empty() {
        None
    } else {
        Some(eliza)
    };

    let root_dir = match &options.target_root {
        Some(target) => cwd.join(target),
        None => cwd.clone(),
    };

    Ok(LoadedConfig {
        figma,
        translations,
        eliza,
        root_dir,
        config_path: found.then_some(config_path),
    })
}

/// 读取配置文件
///
/// # 返回
/// 文件不存在时返回 `None`
///
/// # 错误
/// 文件存在但无法读取或解析时返回 `UpdaterError::Config`
fn read_user_config(path: &Path) -> Result<Option<UserConfig>, UpdaterError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(UpdaterError::Config(format!("无法读取配置文件 {:?}: {}", path, e)));
        }
    };

    serde_json::from_slice::<UserConfig>(&bytes)
        .map(Some)
        .map_err(|e| UpdaterError::Config(format!("无法解析配置文件 {:?}: {}", path, e)))
}
