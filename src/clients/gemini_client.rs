//! Gemini 提取客户端
//!
//! 调用原生 `generateContent` 接口：PDF 以 inline data 传入，
//! 通过 `responseMimeType` + `responseSchema` 要求返回六字段 JSON

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use super::{error_from_response, ExtractionClient};
use crate::config::Config;
use crate::error::{ConfigError, RemoteError};
use crate::models::{DocumentPayload, ExtractedFields};
use crate::services::extraction_service::{self, EXTRACTION_PROMPT};

pub struct GeminiExtractionClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiExtractionClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            http: super::build_http_client(config.request_timeout_secs)?,
            api_key: config.llm_api_key.clone(),
            api_base_url: config.llm_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.llm_model_name.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model_name
        )
    }

    /// 构建请求体
    fn build_request(&self, payload: &DocumentPayload) -> JsonValue {
        json!({
            "contents": [{
                "parts": [
                    { "text": EXTRACTION_PROMPT },
                    {
                        "inline_data": {
                            "mime_type": payload.media_type,
                            "data": BASE64.encode(&payload.bytes),
                        }
                    }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": extraction_service::response_schema(),
            }
        })
    }
}

/// 取第一个候选的全部文本
fn response_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    Some(text)
}

#[async_trait]
impl ExtractionClient for GeminiExtractionClient {
    async fn extract(&self, payload: &DocumentPayload) -> Result<ExtractedFields, RemoteError> {
        debug!(
            "调用 Gemini 提取，模型: {}，文件: {} ({} 字节)",
            self.model_name,
            payload.file_name,
            payload.bytes.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&self.build_request(payload))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!("Gemini API 调用失败: {}", err);
            return Err(err);
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = response_text(body)
            .ok_or_else(|| RemoteError::Malformed("Gemini 返回结果为空".to_string()))?;

        extraction_service::parse_extraction_response(&text)
    }
}
