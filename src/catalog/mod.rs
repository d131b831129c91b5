//! 翻译目录模块
//!
//! 读取 PO 文件，建立 “翻译文本 -> 源码位置列表” 的映射。
//! 解析结果在每个 [`TranslationCatalog`] 实例内缓存，首次读取后不再访问磁盘。

mod location;
mod parser;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::utils::UpdaterError;

pub use location::SourceLocation;
pub use parser::parse_po;

/// 翻译映射
///
/// 保留键的首次插入顺序（即 PO 文件中的顺序），模糊匹配分批时依赖这个顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationsMap {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl TranslationsMap {
    /// 创建空映射
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加位置引用，键不存在时创建
    pub fn push_locations<I>(&mut self, text: String, locations: I)
    where
        I: IntoIterator<Item = String>,
    {
        match self.index.get(&text) {
            Some(&position) => self.entries[position].1.extend(locations),
            None => {
                self.index.insert(text.clone(), self.entries.len());
                self.entries.push((text, locations.into_iter().collect()));
            }
        }
    }

    /// 获取某段文本的位置列表
    pub fn get(&self, text: &str) -> Option<&[String]> {
        self.index
            .get(text)
            .map(|&position| self.entries[position].1.as_slice())
    }

    /// 获取某段文本的非空位置列表，不存在时返回空列表
    pub fn locations(&self, text: &str) -> Vec<&str> {
        self.get(text)
            .map(non_empty_locations)
            .unwrap_or_default()
    }

    /// 查找位置列表中包含指定位置的所有键（按目录顺序）
    pub fn keys_with_location<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, locations)| locations.iter().any(|l| l == location))
            .map(|(text, _)| text.as_str())
    }

    /// 按目录顺序遍历所有条目
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(text, locations)| (text.as_str(), locations.as_slice()))
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for TranslationsMap
where
    K: Into<String>,
    V: IntoIterator,
    V::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (text, locations) in iter {
            map.push_locations(text.into(), locations.into_iter().map(Into::into));
        }
        map
    }
}

/// 过滤掉空白的位置引用
pub(crate) fn non_empty_locations(locations: &[String]) -> Vec<&str> {
    locations
        .iter()
        .map(|location| location.as_str())
        .filter(|location| !location.trim().is_empty())
        .collect()
}

/// 翻译目录
///
/// 负责定位和读取 PO 文件，解析结果缓存在实例内部。
#[derive(Debug)]
pub struct TranslationCatalog {
    path: PathBuf,
    cache: OnceCell<TranslationsMap>,
}

impl TranslationCatalog {
    /// 创建翻译目录
    ///
    /// # 参数
    /// * `path` - PO 文件路径
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: OnceCell::new(),
        }
    }

    /// 使用已解析好的映射创建翻译目录（不访问磁盘）
    pub fn from_map(map: TranslationsMap) -> Self {
        Self {
            path: PathBuf::new(),
            cache: OnceCell::new_with(Some(map)),
        }
    }

    /// 读取并解析 PO 文件
    ///
    /// # 错误
    /// 文件不存在或无法读取时返回 `UpdaterError::Catalog`
    pub async fn read(&self) -> Result<&TranslationsMap, UpdaterError> {
        self.cache
            .get_or_try_init(|| async {
                let content = tokio::fs::read_to_string(&self.path)
                    .await
                    .map_err(|source| UpdaterError::Catalog {
                        path: self.path.clone(),
                        source,
                    })?;

                let map = parse_po(&content);
                tracing::debug!("从 {:?} 读取了 {} 条翻译", self.path, map.len());
                Ok(map)
            })
            .await
    }
}
