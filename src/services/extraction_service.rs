//! 提取能力 - 业务能力层
//!
//! 只负责"提示词 + 响应解析"，不关心具体调用哪个模型服务。
//! Gemini 与 OpenAI 兼容两种客户端共用这里的提示词、JSON Schema 和解析逻辑。

use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::sync::OnceLock;
use tracing::debug;

use crate::error::RemoteError;
use crate::models::ExtractedFields;
use crate::utils::truncate_text;

/// 六个必填字段，顺序即导出列顺序
pub const REQUIRED_FIELDS: [&str; 6] = [
    "documentType",
    "documentNumber",
    "issueDate",
    "subject",
    "signer",
    "recipients",
];

/// 系统提示词
pub const SYSTEM_PROMPT: &str = "你是一名专业的办公室助理，负责从 PDF 公文中提取关键信息。\
                                 只输出符合给定 JSON Schema 的 JSON 对象，不要输出任何解释。";

/// 用户提示词
pub const EXTRACTION_PROMPT: &str = r#"请分析提供的 PDF 文件，返回一个包含以下字段的 JSON 对象：
- `documentType`：文件类型（例如：公文、合同、决定、邀请函……）。
- `documentNumber`：文号及编号。
- `issueDate`：发文日期。
- `subject`：内容摘要（简要概括文件目的）。
- `signer`：签发人（只取姓名，不含职务）。
- `recipients`：收文单位（列出主要单位，如有）。

如果文件中没有某个字段的信息，请返回空字符串 ("")。确保结果严格符合要求的 JSON 格式。"#;

/// 提取结果的 JSON Schema，六个字段全部必填
pub fn response_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "documentType": { "type": "STRING", "description": "文件类型（例如：公文、合同、决定）" },
            "documentNumber": { "type": "STRING", "description": "文号及编号" },
            "issueDate": { "type": "STRING", "description": "发文日期" },
            "subject": { "type": "STRING", "description": "内容摘要（简要概括）" },
            "signer": { "type": "STRING", "description": "签发人（只取姓名，不含职务）" },
            "recipients": { "type": "STRING", "description": "收文单位（列出主要单位）" }
        },
        "required": REQUIRED_FIELDS,
    })
}

/// 把 Schema 拼进提示词（用于不支持 responseSchema 的接口）
pub fn prompt_with_schema() -> String {
    let schema = serde_json::to_string_pretty(&response_schema()).unwrap_or_default();
    format!("{}\n\nJSON Schema：\n{}", EXTRACTION_PROMPT, schema)
}

fn fence_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*(.*?)\s*```$").ok())
        .as_ref()
}

/// 解析模型返回的文本为六个字段
///
/// 容忍 markdown 代码块包裹；顶层不是 JSON 对象视为格式错误
pub fn parse_extraction_response(text: &str) -> Result<ExtractedFields, RemoteError> {
    let trimmed = text.trim();
    let body = fence_regex()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    debug!("模型原始响应: {}", truncate_text(body, 200));

    if body.is_empty() {
        return Err(RemoteError::Malformed("模型返回内容为空".to_string()));
    }

    let value: JsonValue = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(RemoteError::Malformed(format!(
            "期望 JSON 对象，实际为: {}",
            truncate_text(body, 80)
        )));
    }

    Ok(serde_json::from_value(value)?)
}
