use super::TranslationsMap;

const LOCATION_MARKER: &str = "#:";
const KEY_KEYWORD: &str = "msgid";
const VALUE_KEYWORD: &str = "msgstr";

/// 取出第一个与最后一个双引号之间的内容，并展开 `\n` 转义
fn parse_quoted_string(input: &str) -> String {
    let (Some(start), Some(end)) = (input.find('"'), input.rfind('"')) else {
        return String::new();
    };

    if end <= start {
        return String::new();
    }

    input[start + 1..end].replace("\\n", "\n")
}

/// 解析状态
#[derive(Debug, Default)]
struct ParserState {
    /// 最近一行 `#:` 注释中的位置引用
    pending_locations: Vec<String>,
    /// 是否正在累积 msgstr 的内容
    collecting: bool,
    /// 已累积的 msgstr 内容
    buffer: String,
}

impl ParserState {
    /// 结束当前 msgstr，把位置引用写入映射
    fn flush(&mut self, result: &mut TranslationsMap) {
        if !self.collecting {
            return;
        }

        if !self.buffer.is_empty() {
            let locations = std::mem::take(&mut self.pending_locations);
            result.push_locations(std::mem::take(&mut self.buffer), locations);
        }

        self.collecting = false;
        self.buffer.clear();
        self.pending_locations.clear();
    }
}

/// 解析 PO 文件内容
///
/// 只识别以下几种行（行首尾空白会先被去掉）：
/// - `#: path:line path:line` 位置注释，覆盖待写入的位置列表
/// - `msgid ...` 键声明，内容忽略
/// - `msgstr "..."` 值声明，之后紧跟的纯引号行会拼接到值上
///
/// 返回 “翻译文本 -> 源码位置列表” 的映射，同一文本多次出现时位置列表直接追加，不去重。
pub fn parse_po(content: &str) -> TranslationsMap {
    let mut result = TranslationsMap::new();
    let mut state = ParserState::default();

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if let Some(rest) = line.strip_prefix(LOCATION_MARKER) {
            state.pending_locations = rest.split_whitespace().map(str::to_string).collect();
            continue;
        }

        if line.starts_with(KEY_KEYWORD) {
            state.flush(&mut result);
            continue;
        }

        if line.starts_with(VALUE_KEYWORD) {
            state.flush(&mut result);
            state.collecting = true;
            state.buffer = parse_quoted_string(line);
            continue;
        }

        if state.collecting {
            if line.starts_with('"') {
                state.buffer.push_str(&parse_quoted_string(line));
                continue;
            }

            state.flush(&mut result);
        }
    }

    state.flush(&mut result);

    result
}
