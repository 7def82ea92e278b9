//! 外部服务客户端
//!
//! 每个外部协作方一个 trait，编排层只依赖 trait；
//! 具体实现（Gemini / OpenAI 兼容 / Google Drive / Google Sheets / 控制台选择器）
//! 由 `app` 在启动时组装。

pub mod console_picker;
pub mod credentials;
pub mod drive_client;
pub mod gemini_client;
pub mod google_auth;
pub mod openai_client;
pub mod sheets_client;

use async_trait::async_trait;

use crate::error::{AuthError, RemoteError};
use crate::models::{Destination, DocumentPayload, ExtractedFields, UserProfile};

pub use console_picker::ConsolePicker;
pub use credentials::CredentialStore;
pub use drive_client::DriveStorageClient;
pub use gemini_client::GeminiExtractionClient;
pub use google_auth::GoogleAuthGateway;
pub use openai_client::OpenAiExtractionClient;
pub use sheets_client::SheetsClient;

/// AI 信息提取服务
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// 从文档中提取六个字段
    async fn extract(&self, payload: &DocumentPayload) -> Result<ExtractedFields, RemoteError>;
}

/// 文件存储服务
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// 上传到指定文件夹，返回远端文件 ID
    async fn upload(&self, folder_id: &str, payload: &DocumentPayload)
        -> Result<String, RemoteError>;
}

/// 表格服务
#[async_trait]
pub trait SpreadsheetClient: Send + Sync {
    /// 以追加方式写入行（第一行为表头）
    async fn append_rows(&self, sheet_id: &str, rows: &[Vec<String>]) -> Result<(), RemoteError>;
}

/// 交互式目标选择器，用户取消时返回 `None`
#[async_trait]
pub trait DestinationPicker: Send + Sync {
    async fn pick_folder(&self) -> Option<Destination>;
    async fn pick_sheet(&self) -> Option<Destination>;
}

/// 登录成功的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub profile: UserProfile,
}

/// 身份/授权网关
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// 请求用户授权；用户取消或未授权时返回 `Ok(None)`
    async fn sign_in(&self) -> Result<Option<SignIn>, AuthError>;
    /// 撤销当前凭据
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// 构建带超时的 HTTP 客户端
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, crate::error::ConfigError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| crate::error::ConfigError::HttpClient(e.to_string()))
}

/// 把非 2xx 响应转换为 RemoteError
///
/// Google 系接口的错误体为 `{"error": {"message": "..."}}`，取其中的 message；
/// 否则使用响应文本，再否则使用状态码
pub(crate) async fn error_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    RemoteError::rejected(error_message_from_body(status, &body))
}

pub(crate) fn error_message_from_body(status: reqwest::StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error_description"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });

    match from_json {
        Some(msg) if !msg.trim().is_empty() => msg,
        _ if !body.trim().is_empty() => crate::utils::truncate_text(body.trim(), 200),
        _ => format!("HTTP {}", status),
    }
}
