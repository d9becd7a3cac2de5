//! The contract between the route guard and the auth service

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::cookies::{CookieReader, CookieWriter, SetCookie};
use crate::error::Result;

/// An authenticated user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Result of a user lookup.
///
/// A lookup can rotate the session as a side effect; the new cookies are
/// returned here instead of being written behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLookup {
    pub user: Option<AuthUser>,
    pub set_cookies: Option<Vec<SetCookie>>,
}

impl UserLookup {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user: AuthUser) -> Self {
        Self {
            user: Some(user),
            set_cookies: None,
        }
    }

    pub fn with_cookies(mut self, cookies: Vec<SetCookie>) -> Self {
        self.set_cookies = Some(cookies);
        self
    }
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Resolve the current user from the request cookies.
    ///
    /// May refresh an expired session; any cookies to set come back in the
    /// lookup.
    async fn get_user(&self, cookies: &(dyn CookieReader + Sync)) -> Result<UserLookup>;
}

/// Ask the backend for the current user and apply any rotated cookies.
///
/// Backend failures count as "no user"; the error is logged, never returned.
pub async fn resolve_user<C>(backend: &dyn AuthBackend, ctx: &mut C) -> Option<AuthUser>
where
    C: CookieReader + CookieWriter + Sync,
{
    match backend.get_user(&*ctx).await {
        Ok(lookup) => {
            if let Some(batch) = lookup.set_cookies {
                ctx.set_all(batch);
            }
            lookup.user
        }
        Err(e) => {
            tracing::warn!("Auth backend lookup failed, treating as anonymous: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cookies::{CookieOptions, CookieReader};
    use crate::auth::session::SessionContext;
    use crate::error::Error;

    struct Failing;

    #[async_trait]
    impl AuthBackend for Failing {
        async fn get_user(&self, _cookies: &(dyn CookieReader + Sync)) -> Result<UserLookup> {
            Err(Error::AuthBackend("unreachable".to_string()))
        }
    }

    struct Rotating;

    #[async_trait]
    impl AuthBackend for Rotating {
        async fn get_user(&self, _cookies: &(dyn CookieReader + Sync)) -> Result<UserLookup> {
            Ok(UserLookup::user(AuthUser {
                id: "u1".to_string(),
                email: None,
                role: None,
            })
            .with_cookies(vec![SetCookie::new("tok", "fresh", CookieOptions::default())]))
        }
    }

    #[tokio::test]
    async fn test_failure_is_anonymous() {
        let mut ctx = SessionContext::default();
        assert!(resolve_user(&Failing, &mut ctx).await.is_none());
        assert_eq!(ctx.rotations(), 0);
    }

    #[tokio::test]
    async fn test_rotation_applied_before_return() {
        let mut ctx = SessionContext::default();
        let user = resolve_user(&Rotating, &mut ctx).await;
        assert_eq!(user.map(|u| u.id), Some("u1".to_string()));
        assert_eq!(ctx.get("tok"), Some("fresh".to_string()));
        assert_eq!(ctx.pending().len(), 1);
    }
}
