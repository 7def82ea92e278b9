//! 单个文档的数据结构与两个状态机
//!
//! - 提取状态：`Pending → Processing → {Success, Error}`
//! - 存储状态：`Idle → Uploading → {Success, Error}`，只能在提取成功后开始

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// PDF 的媒体类型，唯一被接受的类型
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// 提取失败且没有上游信息时的兜底文案
pub const EXTRACTION_FALLBACK_MESSAGE: &str = "处理文件时发生未知错误";

/// 上传失败且没有上游信息时的兜底文案
pub const STORAGE_FALLBACK_MESSAGE: &str = "上传到云端硬盘时发生未知错误";

/// 文档的二进制内容及元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub file_name: String,
    pub media_type: String,
    /// 最后修改时间（毫秒时间戳）
    pub last_modified: i64,
    pub bytes: Bytes,
}

impl DocumentPayload {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        last_modified: i64,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            last_modified,
            bytes: bytes.into(),
        }
    }

    /// 由文件名和修改时间生成的文档标识
    pub fn identity(&self) -> String {
        format!("{}-{}", self.file_name, self.last_modified)
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }
}

/// AI 提取出的六个字段
///
/// 上游缺失或为 null 的字段统一为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub document_type: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub document_number: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub issue_date: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub subject: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub signer: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub recipients: String,
}

// 字符串、数字、null 都接受，统一转成文本
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// 提取状态（仅状态标签，用于筛选和展示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    Success,
    Error,
}

impl ExtractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::Processing => "processing",
            ExtractionStatus::Success => "success",
            ExtractionStatus::Error => "error",
        }
    }
}

/// 存储状态（仅状态标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

impl StorageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageStatus::Idle => "idle",
            StorageStatus::Uploading => "uploading",
            StorageStatus::Success => "success",
            StorageStatus::Error => "error",
        }
    }
}

/// 提取状态机，成功时携带字段，失败时携带错误信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionState {
    Pending,
    Processing,
    Success(ExtractedFields),
    Error(String),
}

impl ExtractionState {
    pub fn status(&self) -> ExtractionStatus {
        match self {
            ExtractionState::Pending => ExtractionStatus::Pending,
            ExtractionState::Processing => ExtractionStatus::Processing,
            ExtractionState::Success(_) => ExtractionStatus::Success,
            ExtractionState::Error(_) => ExtractionStatus::Error,
        }
    }
}

/// 存储状态机，成功时携带远端文件 ID，失败时携带错误信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageState {
    Idle,
    Uploading,
    Success { file_id: String },
    Error(String),
}

impl StorageState {
    pub fn status(&self) -> StorageStatus {
        match self {
            StorageState::Idle => StorageStatus::Idle,
            StorageState::Uploading => StorageStatus::Uploading,
            StorageState::Success { .. } => StorageStatus::Success,
            StorageState::Error(_) => StorageStatus::Error,
        }
    }
}

/// 进入流水线的单个文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSubmission {
    id: String,
    payload: DocumentPayload,
    extraction: ExtractionState,
    storage: StorageState,
}

impl DocumentSubmission {
    /// 新文档：提取 `Pending`，存储 `Idle`
    pub fn new(payload: DocumentPayload) -> Self {
        Self {
            id: payload.identity(),
            payload,
            extraction: ExtractionState::Pending,
            storage: StorageState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.payload.file_name
    }

    pub fn payload(&self) -> &DocumentPayload {
        &self.payload
    }

    pub fn extraction(&self) -> &ExtractionState {
        &self.extraction
    }

    pub fn storage(&self) -> &StorageState {
        &self.storage
    }

    pub fn extraction_status(&self) -> ExtractionStatus {
        self.extraction.status()
    }

    pub fn storage_status(&self) -> StorageStatus {
        self.storage.status()
    }

    /// 提取成功时的字段
    pub fn extracted_fields(&self) -> Option<&ExtractedFields> {
        match &self.extraction {
            ExtractionState::Success(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn extraction_error(&self) -> Option<&str> {
        match &self.extraction {
            ExtractionState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn storage_file_id(&self) -> Option<&str> {
        match &self.storage {
            StorageState::Success { file_id } => Some(file_id),
            _ => None,
        }
    }

    pub fn storage_error(&self) -> Option<&str> {
        match &self.storage {
            StorageState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    // ========== 提取状态转换 ==========

    /// `Pending → Processing`
    pub fn begin_extraction(&mut self) -> Result<(), TransitionError> {
        match self.extraction {
            ExtractionState::Pending => {
                self.extraction = ExtractionState::Processing;
                Ok(())
            }
            _ => Err(self.extraction_transition_error("processing")),
        }
    }

    /// `Processing → Success`
    pub fn complete_extraction(&mut self, fields: ExtractedFields) -> Result<(), TransitionError> {
        match self.extraction {
            ExtractionState::Processing => {
                self.extraction = ExtractionState::Success(fields);
                Ok(())
            }
            _ => Err(self.extraction_transition_error("success")),
        }
    }

    /// `Processing → Error`
    pub fn fail_extraction(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        match self.extraction {
            ExtractionState::Processing => {
                self.extraction = ExtractionState::Error(message.into());
                Ok(())
            }
            _ => Err(self.extraction_transition_error("error")),
        }
    }

    // ========== 存储状态转换 ==========

    /// `Idle → Uploading`，要求提取已成功
    pub fn begin_upload(&mut self) -> Result<(), TransitionError> {
        match (&self.extraction, &self.storage) {
            (ExtractionState::Success(_), StorageState::Idle) => {
                self.storage = StorageState::Uploading;
                Ok(())
            }
            _ => Err(self.storage_transition_error("uploading")),
        }
    }

    /// `Uploading → Success`
    pub fn complete_upload(&mut self, file_id: impl Into<String>) -> Result<(), TransitionError> {
        match self.storage {
            StorageState::Uploading => {
                self.storage = StorageState::Success {
                    file_id: file_id.into(),
                };
                Ok(())
            }
            _ => Err(self.storage_transition_error("success")),
        }
    }

    /// `Uploading → Error`，不影响提取状态
    pub fn fail_upload(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        match self.storage {
            StorageState::Uploading => {
                self.storage = StorageState::Error(message.into());
                Ok(())
            }
            _ => Err(self.storage_transition_error("error")),
        }
    }

    fn extraction_transition_error(&self, to: &'static str) -> TransitionError {
        TransitionError {
            id: self.id.clone(),
            from: self.extraction_status().as_str(),
            to,
        }
    }

    fn storage_transition_error(&self, to: &'static str) -> TransitionError {
        TransitionError {
            id: self.id.clone(),
            from: self.storage_status().as_str(),
            to,
        }
    }
}

/// 提供给展示层的只读视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: String,
    pub file_name: String,
    pub status: ExtractionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub drive_upload_status: StorageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_error_message: Option<String>,
}

impl From<&DocumentSubmission> for SubmissionView {
    fn from(sub: &DocumentSubmission) -> Self {
        Self {
            id: sub.id.clone(),
            file_name: sub.payload.file_name.clone(),
            status: sub.extraction_status(),
            extracted_data: sub.extracted_fields().cloned(),
            error_message: sub.extraction_error().map(str::to_string),
            drive_upload_status: sub.storage_status(),
            drive_file_id: sub.storage_file_id().map(str::to_string),
            drive_error_message: sub.storage_error().map(str::to_string),
        }
    }
}
