use std::fmt;
use std::path::{Path, PathBuf};

/// 源码位置引用
///
/// PO 文件中的格式为 `path[:line]`。只有末尾是纯数字时才视为行号，
/// 因此 `C:\src\a.ts:3` 这类带盘符的路径也能正确拆分。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// 相对路径（相对于项目根目录）
    pub path: String,
    /// 行号（可选）
    pub line: Option<u32>,
}

impl SourceLocation {
    /// 解析 `path[:line]` 格式的位置引用
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some((path, line)) = raw.rsplit_once(':') {
            if let Ok(line) = line.parse::<u32>() {
                return Self {
                    path: path.to_string(),
                    line: Some(line),
                };
            }
        }

        Self {
            path: raw.to_string(),
            line: None,
        }
    }

    /// 相对于根目录解析出文件路径
    pub fn resolve(&self, root_dir: &Path) -> PathBuf {
        root_dir.join(&self.path)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.path, line),
            None => write!(f, "{}", self.path),
        }
    }
}
