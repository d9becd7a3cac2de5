//! Client for the hosted auth service's REST API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::backend::{AuthBackend, AuthUser, UserLookup};
use crate::auth::cookies::{CookieOptions, CookieReader, SameSite, SetCookie};
use crate::auth::jwt;
use crate::auth::session::SessionTokens;
use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Tokens issued by a successful refresh
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Outcome of a refresh attempt
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Refreshed(TokenGrant),
    /// The service no longer accepts the refresh token
    Rejected,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// HTTPS client for the hosted auth service
#[derive(Clone)]
pub struct HostedAuthClient {
    http: reqwest::Client,
    config: AuthConfig,
}

impl HostedAuthClient {
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<RefreshOutcome> {
        let response = self
            .http
            .post(self.endpoint("/auth/v1/token?grant_type=refresh_token"))
            .header("apikey", &self.config.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let grant: TokenGrant = response.json().await?;
            tracing::debug!("Session refreshed");
            return Ok(RefreshOutcome::Refreshed(grant));
        }

        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            tracing::info!("Refresh token rejected by auth service ({})", status);
            return Ok(RefreshOutcome::Rejected);
        }

        Err(Error::AuthBackend(format!(
            "token refresh failed with status {}",
            status
        )))
    }

    /// Look up the user owning `access_token`; `None` when the token is refused
    pub async fn fetch_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let response = self
            .http
            .get(self.endpoint("/auth/v1/user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(Error::AuthBackend(format!(
                "user lookup failed with status {}",
                status
            ))),
        }
    }

    fn cookie_options(&self) -> CookieOptions {
        let cookie = &self.config.cookie;
        CookieOptions {
            path: Some(cookie.path.clone()),
            domain: cookie.domain.clone(),
            max_age: Some(cookie.max_age_secs),
            http_only: cookie.http_only,
            secure: cookie.secure,
            same_site: Some(SameSite::from_config(&cookie.same_site)),
        }
    }

    fn session_cookies(&self, grant: &TokenGrant) -> Vec<SetCookie> {
        let options = self.cookie_options();
        vec![
            SetCookie::new(&self.config.access_cookie, &grant.access_token, options.clone()),
            SetCookie::new(&self.config.refresh_cookie, &grant.refresh_token, options),
        ]
    }

    fn cleared_cookies(&self) -> Vec<SetCookie> {
        let options = self.cookie_options();
        vec![
            SetCookie::removal(&self.config.access_cookie, options.clone()),
            SetCookie::removal(&self.config.refresh_cookie, options),
        ]
    }

    /// Whether the access token must be refreshed before use
    fn needs_refresh(&self, access_token: Option<&str>) -> bool {
        match access_token.map(jwt::peek_claims) {
            Some(Ok(claims)) => claims.expires_within(self.config.refresh_margin_secs),
            Some(Err(_)) | None => true,
        }
    }

    async fn verify_access_token(&self, access_token: &str) -> Result<Option<AuthUser>> {
        match &self.config.jwt_secret {
            Some(secret) => {
                match jwt::verify_token(access_token, secret, self.config.jwt_audience.as_deref()) {
                    Ok(claims) => Ok(Some(claims.to_user())),
                    Err(e) => {
                        tracing::debug!("Access token failed local verification: {}", e);
                        Ok(None)
                    }
                }
            }
            None => self.fetch_user(access_token).await,
        }
    }
}

#[async_trait]
impl AuthBackend for HostedAuthClient {
    async fn get_user(&self, cookies: &(dyn CookieReader + Sync)) -> Result<UserLookup> {
        let tokens = SessionTokens::read(
            cookies,
            &self.config.access_cookie,
            &self.config.refresh_cookie,
        );
        if tokens.is_empty() {
            return Ok(UserLookup::anonymous());
        }

        if let Some(refresh_token) = tokens.refresh_token.as_deref() {
            if self.needs_refresh(tokens.access_token.as_deref()) {
                return match self.refresh_session(refresh_token).await? {
                    RefreshOutcome::Refreshed(grant) => {
                        // The old refresh token is spent; the new pair must reach the client
                        let cookies = self.session_cookies(&grant);
                        let user = match grant.user.clone() {
                            Some(user) => Some(user),
                            None => match self.verify_access_token(&grant.access_token).await {
                                Ok(user) => user,
                                Err(e) => {
                                    tracing::warn!("User lookup after refresh failed: {}", e);
                                    None
                                }
                            },
                        };
                        Ok(UserLookup { user, set_cookies: Some(cookies) })
                    }
                    RefreshOutcome::Rejected => {
                        Ok(UserLookup::anonymous().with_cookies(self.cleared_cookies()))
                    }
                };
            }
        }

        match tokens.access_token.as_deref() {
            Some(access_token) => Ok(UserLookup {
                user: self.verify_access_token(access_token).await?,
                set_cookies: None,
            }),
            None => Ok(UserLookup::anonymous()),
        }
    }
}
