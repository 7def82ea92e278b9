//! Google 身份网关
//!
//! 使用配置中预先签发的 OAuth 访问令牌（需包含 drive.file 与 spreadsheets 权限）：
//! 登录时校验令牌并获取用户信息，登出时撤销令牌

use async_trait::async_trait;
use tracing::{info, warn};

use super::{error_from_response, AuthGateway, CredentialStore, SignIn};
use crate::config::Config;
use crate::error::{AuthError, ConfigError, RemoteError};
use crate::models::UserProfile;

/// 所需授权范围
pub const SCOPES: &str =
    "https://www.googleapis.com/auth/drive.file https://www.googleapis.com/auth/spreadsheets";

const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

pub struct GoogleAuthGateway {
    http: reqwest::Client,
    access_token: String,
    oauth_base_url: String,
    credentials: CredentialStore,
}

impl GoogleAuthGateway {
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self, ConfigError> {
        Ok(Self {
            http: super::build_http_client(config.request_timeout_secs)?,
            access_token: config.google_access_token.trim().to_string(),
            oauth_base_url: config.oauth_api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, RemoteError> {
        let response = self
            .http
            .get(format!("{}/oauth2/v1/userinfo", self.oauth_base_url))
            .query(&[("alt", "json")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthGateway for GoogleAuthGateway {
    async fn sign_in(&self) -> Result<Option<SignIn>, AuthError> {
        if self.access_token.is_empty() {
            warn!("⚠️ 未配置 GOOGLE_ACCESS_TOKEN，无法登录（所需权限: {}）", SCOPES);
            return Ok(None);
        }

        let profile = self
            .fetch_profile(&self.access_token)
            .await
            .map_err(AuthError::ProfileFetchFailed)?;

        self.credentials.set(self.access_token.clone()).await;
        info!("✓ 已登录: {} <{}>", profile.name, profile.email);

        Ok(Some(SignIn { profile }))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(token) = self.credentials.clear().await else {
            return Ok(());
        };

        let response = self
            .http
            .post(REVOKE_URL)
            .form(&[("token", token.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::RevokeFailed(e.into()))?;

        if !response.status().is_success() {
            return Err(AuthError::RevokeFailed(error_from_response(response).await));
        }

        info!("✓ 已撤销访问令牌");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_without_token_is_cancel() {
        let store = CredentialStore::new();
        let gateway = GoogleAuthGateway::new(&Config::default(), store.clone()).unwrap();

        assert!(gateway.sign_in().await.unwrap().is_none());
        assert!(store.token().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_credential_is_noop() {
        let gateway = GoogleAuthGateway::new(&Config::default(), CredentialStore::new()).unwrap();
        assert!(gateway.sign_out().await.is_ok());
    }
}
