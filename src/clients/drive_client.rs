//! Google Drive 存储客户端
//!
//! multipart/related 上传：第一段为 JSON 元数据，第二段为 base64 文件内容

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{error_from_response, CredentialStore, StorageClient};
use crate::config::Config;
use crate::error::{ConfigError, RemoteError};
use crate::models::DocumentPayload;

const BOUNDARY: &str = "-------314159265358979323846";

pub struct DriveStorageClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialStore,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: Option<String>,
}

impl DriveStorageClient {
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self, ConfigError> {
        Ok(Self {
            http: super::build_http_client(config.request_timeout_secs)?,
            base_url: config.drive_api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

/// 构建 multipart/related 请求体
fn multipart_body(folder_id: &str, payload: &DocumentPayload) -> String {
    let delimiter = format!("\r\n--{}\r\n", BOUNDARY);
    let close_delim = format!("\r\n--{}--", BOUNDARY);

    let metadata = json!({
        "name": payload.file_name,
        "mimeType": payload.media_type,
        "parents": [folder_id],
    });

    format!(
        "{delim}Content-Type: application/json; charset=UTF-8\r\n\r\n{meta}{delim}Content-Type: {mime}\r\nContent-Transfer-Encoding: base64\r\n\r\n{data}{close}",
        delim = delimiter,
        meta = metadata,
        mime = payload.media_type,
        data = BASE64.encode(&payload.bytes),
        close = close_delim,
    )
}

#[async_trait]
impl StorageClient for DriveStorageClient {
    async fn upload(
        &self,
        folder_id: &str,
        payload: &DocumentPayload,
    ) -> Result<String, RemoteError> {
        let token = self.credentials.bearer().await?;
        debug!(
            "上传到 Drive 文件夹 {}: {} ({} 字节)",
            folder_id,
            payload.file_name,
            payload.bytes.len()
        );

        let response = self
            .http
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .query(&[("uploadType", "multipart")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary=\"{}\"", BOUNDARY),
            )
            .body(multipart_body(folder_id, payload))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!("Drive 上传失败: {}", err);
            return Err(err);
        }

        let file: DriveFile = response.json().await?;
        file.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RemoteError::Malformed("Drive 响应中缺少文件 ID".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PDF_MEDIA_TYPE;

    #[test]
    fn test_multipart_body_layout() {
        let payload = DocumentPayload::new("báo cáo.pdf", PDF_MEDIA_TYPE, 1, b"%PDF".to_vec());
        let body = multipart_body("folder-9", &payload);

        assert!(body.starts_with(&format!("\r\n--{}\r\n", BOUNDARY)));
        assert!(body.ends_with(&format!("\r\n--{}--", BOUNDARY)));
        assert!(body.contains(r#""parents":["folder-9"]"#));
        assert!(body.contains(r#""name":"báo cáo.pdf""#));
        assert!(body.contains("Content-Type: application/pdf\r\nContent-Transfer-Encoding: base64\r\n\r\nJVBERg=="));
    }

    #[tokio::test]
    async fn test_upload_requires_sign_in() {
        let client = DriveStorageClient::new(&Config::default(), CredentialStore::new()).unwrap();
        let payload = DocumentPayload::new("a.pdf", PDF_MEDIA_TYPE, 1, b"%PDF".to_vec());

        let err = client.upload("folder", &payload).await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
    }
}
