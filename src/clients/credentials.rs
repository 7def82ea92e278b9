//! 访问令牌的共享存放处
//!
//! 登录网关写入，Drive / Sheets 客户端读取；登出时清空

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::RemoteError;

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear(&self) -> Option<String> {
        self.token.write().await.take()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// 获取访问令牌，未登录时返回错误
    pub async fn bearer(&self) -> Result<String, RemoteError> {
        self.token()
            .await
            .ok_or_else(|| RemoteError::rejected("尚未登录 Google 账号"))
    }
}
