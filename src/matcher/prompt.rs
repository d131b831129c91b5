//! 提示词与请求体

use serde_json::{json, Value};

use super::chunking::TranslationChunk;

/// JSON Schema 名称
pub const RESPONSE_SCHEMA_NAME: &str = "code_path_response";

/// 构建单批的提示词
///
/// 要求服务只接受不改变含义的差异（标点、空白、连字符、Unicode 变体），
/// 并返回最佳匹配键的全部位置引用。
pub fn build_prompt(old_text: &str, chunk: &TranslationChunk<'_>) -> Result<String, serde_json::Error> {
    let payload = chunk.to_pretty_json()?;

    Ok(format!(
        r#"You are given a JSON object where each KEY is a localized string and the VALUE lists file references for that string (comma separated, in "path:line" format).

Find the key that best matches "{old_text}". You may ignore differences in punctuation, spaces, dashes and Unicode symbol variants, but reject matches that change the meaning or add extra words. Removed or reordered words that change the meaning must not match either.

Return EVERY file reference for the best matching key. If nothing matches, respond with an empty array.

Respond strictly as JSON: {{"codePaths": ["<path:line>"]}}.

JSON object:
{payload}
"#
    ))
}

/// 构建聊天补全请求体
pub fn build_request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": prompt,
            }
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": RESPONSE_SCHEMA_NAME,
                "schema": {
                    "type": "object",
                    "properties": {
                        "codePaths": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["codePaths"],
                    "additionalProperties": false
                }
            }
        }
    })
}
