//! OpenAI 兼容提取客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（兼容 OpenAI API 的网关，如 Azure、Gemini、Doubao 等）
//! - PDF 以 base64 data URL 形式作为内容片段传入，Schema 写在提示词中

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

use super::ExtractionClient;
use crate::config::Config;
use crate::error::RemoteError;
use crate::models::{DocumentPayload, ExtractedFields};
use crate::services::extraction_service::{self, SYSTEM_PROMPT};

pub struct OpenAiExtractionClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiExtractionClient {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 构建 `[system, user(text + file)]` 消息列表
    fn build_messages(
        &self,
        payload: &DocumentPayload,
    ) -> Result<Vec<ChatCompletionRequestMessage>, RemoteError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: extraction_service::prompt_with_schema(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url(payload),
                        detail: Some(ImageDetail::High),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        Ok(vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ])
    }
}

/// `data:<mime>;base64,<data>`
fn data_url(payload: &DocumentPayload) -> String {
    format!(
        "data:{};base64,{}",
        payload.media_type,
        BASE64.encode(&payload.bytes)
    )
}

#[async_trait]
impl ExtractionClient for OpenAiExtractionClient {
    async fn extract(&self, payload: &DocumentPayload) -> Result<ExtractedFields, RemoteError> {
        debug!(
            "调用 LLM API 提取，模型: {}，文件: {} ({} 字节)",
            self.model_name,
            payload.file_name,
            payload.bytes.len()
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(self.build_messages(payload)?)
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            RemoteError::rejected(e.to_string())
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| RemoteError::Malformed("LLM 返回内容为空".to_string()))?;

        extraction_service::parse_extraction_response(&content)
    }
}
