//! Google Sheets 客户端
//!
//! 只用 `values:append`，不会覆盖已有数据

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::{error_from_response, CredentialStore, SpreadsheetClient};
use crate::config::Config;
use crate::error::{ConfigError, RemoteError};

pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    range: String,
    credentials: CredentialStore,
}

impl SheetsClient {
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self, ConfigError> {
        Ok(Self {
            http: super::build_http_client(config.request_timeout_secs)?,
            base_url: config.sheets_api_base_url.trim_end_matches('/').to_string(),
            range: config.sheet_range.clone(),
            credentials,
        })
    }

    fn append_url(&self, sheet_id: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.base_url, sheet_id, self.range
        )
    }
}

#[async_trait]
impl SpreadsheetClient for SheetsClient {
    async fn append_rows(&self, sheet_id: &str, rows: &[Vec<String>]) -> Result<(), RemoteError> {
        let token = self.credentials.bearer().await?;
        debug!("追加 {} 行到表格 {}", rows.len(), sheet_id);

        let response = self
            .http
            .post(self.append_url(sheet_id))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!("表格追加失败: {}", err);
            return Err(err);
        }

        Ok(())
    }
}
