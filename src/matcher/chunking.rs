//! 模糊匹配请求的分批
//!
//! 把翻译目录切成若干批，每批同时受条目数与序列化长度两个上限约束。
//! 这里是纯函数，不涉及网络。

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::{non_empty_locations, TranslationsMap};

/// 每批最多的条目数
pub const PROMPT_CHUNK_MAX_ENTRIES: usize = 200;
/// 每批序列化后（带缩进的 JSON）的最大字符数
pub const PROMPT_CHUNK_MAX_LENGTH: usize = 12_000;

/// `{\n` 与 `\n}`
const OBJECT_FRAME_LEN: usize = 4;
/// 条目之间的 `,\n`
const ENTRY_SEPARATOR_LEN: usize = 2;
/// 条目前的两个空格缩进加上 `: `
const ENTRY_PUNCTUATION_LEN: usize = 4;

/// 批中的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry<'a> {
    /// 翻译文本
    pub text: &'a str,
    /// 非空的位置引用
    pub locations: Vec<&'a str>,
}

impl<'a> ChunkEntry<'a> {
    /// 提示词中的位置列表（逗号分隔）
    pub fn joined_locations(&self) -> String {
        self.locations.join(", ")
    }

    /// 该条目在带缩进 JSON 中占用的字符数（不含分隔符）
    fn serialized_len(&self) -> usize {
        ENTRY_PUNCTUATION_LEN + json_len(self.text) + json_len(&self.joined_locations())
    }
}

/// 字符串编码为 JSON 字面量后的字符数
fn json_len(value: &str) -> usize {
    serde_json::to_string(value).map_or(0, |encoded| encoded.chars().count())
}

/// 一批翻译条目
///
/// 序列化为 `{"文本": "path:line, path:line"}` 形式的 JSON 对象，键顺序与目录一致。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationChunk<'a> {
    entries: Vec<ChunkEntry<'a>>,
    content_len: usize,
}

impl<'a> TranslationChunk<'a> {
    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历条目
    pub fn iter(&self) -> impl Iterator<Item = &ChunkEntry<'a>> {
        self.entries.iter()
    }

    /// 带缩进 JSON 的字符数，空批为 0
    pub fn serialized_len(&self) -> usize {
        Self::length_for(self.entries.len(), self.content_len)
    }

    /// 加入 `entry_len` 长度的条目后的字符数
    fn len_with(&self, entry_len: usize) -> usize {
        Self::length_for(self.entries.len() + 1, self.content_len + entry_len)
    }

    fn length_for(count: usize, content_len: usize) -> usize {
        if count == 0 {
            return 0;
        }

        OBJECT_FRAME_LEN + content_len + ENTRY_SEPARATOR_LEN * (count - 1)
    }

    fn push(&mut self, entry: ChunkEntry<'a>, entry_len: usize) {
        self.entries.push(entry);
        self.content_len += entry_len;
    }

    /// 带缩进的 JSON 文本（嵌入提示词）
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for TranslationChunk<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.text, &entry.joined_locations())?;
        }
        map.end()
    }
}

/// 使用默认上限分批
pub fn chunk_translations(translations: &TranslationsMap) -> Vec<TranslationChunk<'_>> {
    chunk_translations_with_limits(translations, PROMPT_CHUNK_MAX_ENTRIES, PROMPT_CHUNK_MAX_LENGTH)
}

/// 按给定上限贪心分批
///
/// # 规则
/// - 没有位置引用的条目被排除
/// - 依次尝试把条目放入当前批；放入后会超过任一上限时，先提交当前批再放入新批
/// - 当前批达到任一上限时立即提交
/// - 单个条目本身超过长度上限时独占一批
pub fn chunk_translations_with_limits(
    translations: &TranslationsMap,
    max_entries: usize,
    max_length: usize,
) -> Vec<TranslationChunk<'_>> {
    let mut chunks = Vec::new();
    let mut current = TranslationChunk::default();

    for (text, locations) in translations.iter() {
        let locations = non_empty_locations(locations);

        if locations.is_empty() {
            continue;
        }

        let entry = ChunkEntry { text, locations };
        let entry_len = entry.serialized_len();

        let exceeds_entry_limit = current.len() + 1 > max_entries;
        let exceeds_length_limit = current.len_with(entry_len) > max_length;

        if !current.is_empty() && (exceeds_entry_limit || exceeds_length_limit) {
            chunks.push(std::mem::take(&mut current));
            current.push(entry, entry_len);

            if current.serialized_len() >= max_length {
                chunks.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(entry, entry_len);

        if current.len() >= max_entries || current.serialized_len() >= max_length {
            chunks.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
