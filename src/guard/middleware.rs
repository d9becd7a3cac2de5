//! Session refresh and admin route guard

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::server::AppState;
use crate::auth::{resolve_user, AuthBackend, CookieReader, CookieWriter, SessionContext};

use super::routes::{RouteClass, RoutePolicy};

/// What the guard decided for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Continue to the requested page
    PassThrough,
    /// Send the client to the login page
    Redirect(String),
}

/// Run the guard for `path` against the session in `ctx`.
///
/// The first lookup always runs so sessions stay fresh on every page. Protected
/// paths then look the user up again, after the first lookup's cookies have
/// been applied.
pub async fn evaluate<C>(
    policy: &RoutePolicy,
    backend: &dyn AuthBackend,
    ctx: &mut C,
    path: &str,
) -> GuardOutcome
where
    C: CookieReader + CookieWriter + Sync,
{
    let refreshed = resolve_user(backend, ctx).await;
    tracing::debug!(path, user = ?refreshed.as_ref().map(|u| &u.id), "Session checked");

    match policy.classify(path) {
        RouteClass::Public => GuardOutcome::PassThrough,
        RouteClass::Protected => match resolve_user(backend, ctx).await {
            Some(user) => {
                tracing::debug!(path, user = %user.id, "Access granted");
                GuardOutcome::PassThrough
            }
            None => {
                tracing::debug!(path, "No authenticated user, redirecting to login");
                GuardOutcome::Redirect(policy.login_path().to_string())
            }
        },
    }
}

/// Axum middleware wrapping every route of the gateway
pub async fn session_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if state.policy.is_excluded(&path) {
        return next.run(req).await;
    }

    let mut ctx = SessionContext::from_headers(req.headers());
    let outcome = evaluate(&state.policy, state.backend.as_ref(), &mut ctx, &path).await;

    let mut response = match outcome {
        GuardOutcome::PassThrough => {
            // Untouched sessions keep the client's Cookie header verbatim
            if ctx.rotations() > 0 {
                ctx.write_request_cookies(req.headers_mut());
            }
            next.run(req).await
        }
        GuardOutcome::Redirect(location) => Redirect::temporary(&location).into_response(),
    };

    ctx.write_response_cookies(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, CookieJar, CookieOptions, SetCookie, UserLookup};
    use crate::config::GuardConfig;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Authenticates whoever carries `session=valid`
    struct CookieBackend {
        calls: AtomicUsize,
    }

    impl CookieBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthBackend for CookieBackend {
        async fn get_user(&self, cookies: &(dyn CookieReader + Sync)) -> Result<UserLookup> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match cookies.get("session").as_deref() {
                Some("valid") => Ok(UserLookup::user(AuthUser {
                    id: "admin".to_string(),
                    email: None,
                    role: None,
                })),
                Some("expired") => Ok(UserLookup::user(AuthUser {
                    id: "admin".to_string(),
                    email: None,
                    role: None,
                })
                .with_cookies(vec![SetCookie::new("session", "valid", CookieOptions::default())])),
                _ => Ok(UserLookup::anonymous()),
            }
        }
    }

    fn policy() -> RoutePolicy {
        RoutePolicy::from_config(&GuardConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_public_path_checks_once() {
        let backend = CookieBackend::new();
        let mut ctx = SessionContext::default();
        let outcome = evaluate(&policy(), &backend, &mut ctx, "/notices").await;
        assert_eq!(outcome, GuardOutcome::PassThrough);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_protected_path_checks_twice() {
        let backend = CookieBackend::new();
        let mut ctx = SessionContext::new(CookieJar::parse("session=valid"));
        let outcome = evaluate(&policy(), &backend, &mut ctx, "/admin").await;
        assert_eq!(outcome, GuardOutcome::PassThrough);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_anonymous_admin_redirects() {
        let backend = CookieBackend::new();
        let mut ctx = SessionContext::default();
        let outcome = evaluate(&policy(), &backend, &mut ctx, "/admin/teachers").await;
        assert_eq!(outcome, GuardOutcome::Redirect("/admin/login".to_string()));
    }

    #[tokio::test]
    async fn test_second_lookup_sees_rotated_cookie() {
        let backend = CookieBackend::new();
        let mut ctx = SessionContext::new(CookieJar::parse("session=expired"));
        let outcome = evaluate(&policy(), &backend, &mut ctx, "/admin").await;
        assert_eq!(outcome, GuardOutcome::PassThrough);
        assert_eq!(ctx.get("session"), Some("valid".to_string()));
        assert_eq!(ctx.rotations(), 1);
    }
}
