//! Per-request session context

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use super::cookies::{Cookie, CookieJar, CookieReader, CookieWriter, SetCookie};

/// Access and refresh tokens as carried by the request cookies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    /// Read the token pair from `cookies` using the configured cookie names
    pub fn read(cookies: &dyn CookieReader, access_cookie: &str, refresh_cookie: &str) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            access_token: non_empty(cookies.get(access_cookie)),
            refresh_token: non_empty(cookies.get(refresh_cookie)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Mutable cookie state owned by one request for its whole duration.
///
/// The request jar is what downstream handlers see. The pending batch is what
/// gets written onto the response that is finally returned; every batch from
/// the backend replaces the previous one, the same way a freshly built
/// pass-through response would.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    request: CookieJar,
    response: Vec<SetCookie>,
    rotations: usize,
}

impl SessionContext {
    pub fn new(request: CookieJar) -> Self {
        Self {
            request,
            response: Vec::new(),
            rotations: 0,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(CookieJar::from_headers(headers))
    }

    pub fn request_jar(&self) -> &CookieJar {
        &self.request
    }

    /// Cookies that will be set on the returned response
    pub fn pending(&self) -> &[SetCookie] {
        &self.response
    }

    /// Token pair as the request currently carries it, rotations included
    pub fn tokens(&self, access_cookie: &str, refresh_cookie: &str) -> SessionTokens {
        SessionTokens::read(&self.request, access_cookie, refresh_cookie)
    }

    /// Number of cookie batches the backend delivered during this request
    pub fn rotations(&self) -> usize {
        self.rotations
    }

    /// Rewrite the `Cookie` header so downstream sees refreshed tokens
    pub fn write_request_cookies(&self, headers: &mut HeaderMap) {
        headers.remove(COOKIE);
        if self.request.is_empty() {
            return;
        }
        match HeaderValue::from_str(&self.request.to_header_string()) {
            Ok(value) => {
                headers.insert(COOKIE, value);
            }
            Err(e) => tracing::warn!("Dropping unrepresentable cookie header: {}", e),
        }
    }

    /// Append one `Set-Cookie` header per pending cookie
    pub fn write_response_cookies(&self, headers: &mut HeaderMap) {
        for cookie in &self.response {
            match cookie.to_header_value() {
                Some(value) => {
                    headers.append(SET_COOKIE, value);
                }
                None => tracing::warn!("Skipping unrepresentable cookie '{}'", cookie.name),
            }
        }
    }
}

impl CookieReader for SessionContext {
    fn get_all(&self) -> Vec<Cookie> {
        self.request.get_all()
    }

    fn get(&self, name: &str) -> Option<String> {
        self.request.get(name)
    }
}

impl CookieWriter for SessionContext {
    fn set_all(&mut self, batch: Vec<SetCookie>) {
        let batch: Vec<SetCookie> = batch
            .into_iter()
            .filter(|cookie| {
                let ok = cookie.is_well_formed();
                if !ok {
                    tracing::warn!("Ignoring malformed cookie '{}' from auth backend", cookie.name);
                }
                ok
            })
            .collect();

        for cookie in &batch {
            if cookie.is_removal() {
                self.request.remove(&cookie.name);
            } else {
                self.request.set(&cookie.name, &cookie.value);
            }
        }

        self.response = batch;
        self.rotations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cookies::CookieOptions;

    fn set(name: &str, value: &str) -> SetCookie {
        SetCookie::new(name, value, CookieOptions::default())
    }

    #[test]
    fn test_tokens_from_cookies() {
        let jar = CookieJar::parse("sb-access-token=aaa; sb-refresh-token=rrr");
        let tokens = SessionTokens::read(&jar, "sb-access-token", "sb-refresh-token");
        assert_eq!(tokens.access_token.as_deref(), Some("aaa"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("rrr"));
    }

    #[test]
    fn test_empty_token_is_absent() {
        let jar = CookieJar::parse("sb-access-token=; other=1");
        let tokens = SessionTokens::read(&jar, "sb-access-token", "sb-refresh-token");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_batch_updates_request_and_response() {
        let mut ctx = SessionContext::new(CookieJar::parse("a=old; keep=1"));
        ctx.set_all(vec![set("a", "new")]);

        assert_eq!(ctx.get("a"), Some("new".to_string()));
        assert_eq!(ctx.get("keep"), Some("1".to_string()));
        assert_eq!(ctx.pending(), &[set("a", "new")]);
        assert_eq!(ctx.rotations(), 1);
    }

    #[test]
    fn test_tokens_follow_rotation() {
        let mut ctx = SessionContext::new(CookieJar::parse("sb-access-token=old; sb-refresh-token=r1"));
        ctx.set_all(vec![set("sb-access-token", "new"), set("sb-refresh-token", "r2")]);

        let tokens = ctx.tokens("sb-access-token", "sb-refresh-token");
        assert_eq!(tokens.access_token.as_deref(), Some("new"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("r2"));
    }

    #[test]
    fn test_later_batch_replaces_earlier_response() {
        let mut ctx = SessionContext::default();
        ctx.set_all(vec![set("a", "1"), set("b", "1")]);
        ctx.set_all(vec![set("a", "2")]);

        assert_eq!(ctx.pending(), &[set("a", "2")]);
        // request side accumulates
        assert_eq!(ctx.get("b"), Some("1".to_string()));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let mut ctx = SessionContext::default();
        ctx.set_all(vec![set("good", "1"), set("bad", "x;y"), set("", "z")]);

        assert_eq!(ctx.pending().len(), 1);
        assert_eq!(ctx.get("bad"), None);
    }

    #[test]
    fn test_removal_clears_request_cookie() {
        let mut ctx = SessionContext::new(CookieJar::parse("a=1; b=2"));
        ctx.set_all(vec![SetCookie::removal("a", CookieOptions::default())]);

        assert_eq!(ctx.get("a"), None);
        let mut headers = HeaderMap::new();
        ctx.write_request_cookies(&mut headers);
        assert_eq!(headers.get(COOKIE).unwrap(), "b=2");
    }

    #[test]
    fn test_write_response_cookies() {
        let mut ctx = SessionContext::default();
        ctx.set_all(vec![set("a", "1"), set("b", "2")]);

        let mut headers = HeaderMap::new();
        ctx.write_response_cookies(&mut headers);
        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "a=1");
    }

    #[test]
    fn test_empty_jar_removes_cookie_header() {
        let ctx = SessionContext::default();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("stale=1"));
        ctx.write_request_cookies(&mut headers);
        assert!(headers.get(COOKIE).is_none());
    }
}
