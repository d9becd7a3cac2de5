//! Cookie jar and the reader/writer capabilities handed to the auth backend

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cookie carried on a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Parse a config value; unknown values fall back to `Lax`
    pub fn from_config(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => SameSite::Lax,
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes of a `Set-Cookie` instruction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

/// A cookie the auth backend asks us to set on the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// Build an instruction that deletes `name` on the client
    pub fn removal(name: impl Into<String>, mut options: CookieOptions) -> Self {
        options.max_age = Some(0);
        Self::new(name, "", options)
    }

    /// `Max-Age=0` tells the browser to drop the cookie
    pub fn is_removal(&self) -> bool {
        matches!(self.options.max_age, Some(age) if age <= 0)
    }

    /// Whether this entry can be carried in a header without corrupting it
    pub fn is_well_formed(&self) -> bool {
        is_token(&self.name) && is_cookie_value(&self.value)
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header_string(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.options.path {
            out.push_str(&format!("; Path={}", path));
        }
        if let Some(domain) = &self.options.domain {
            out.push_str(&format!("; Domain={}", domain));
        }
        if let Some(max_age) = self.options.max_age {
            out.push_str(&format!("; Max-Age={}", max_age.max(0)));
        }
        if self.options.http_only {
            out.push_str("; HttpOnly");
        }
        if self.options.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.options.same_site {
            out.push_str(&format!("; SameSite={}", same_site));
        }
        out
    }

    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_header_string()).ok()
    }
}

/// RFC 6265 token characters for cookie names
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// RFC 6265 cookie-value: cookie-octets, optionally wrapped in one pair of DQUOTEs
fn is_cookie_value(value: &str) -> bool {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    inner.bytes().all(is_cookie_octet)
}

/// RFC 6265 cookie-octet
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// Capability to list the cookies of the current request
pub trait CookieReader {
    fn get_all(&self) -> Vec<Cookie>;

    fn get(&self, name: &str) -> Option<String> {
        self.get_all()
            .into_iter()
            .find(|cookie| cookie.name == name)
            .map(|cookie| cookie.value)
    }
}

/// Capability to accept a batch of cookies issued by the auth backend
pub trait CookieWriter {
    fn set_all(&mut self, batch: Vec<SetCookie>);
}

/// Ordered set of request cookies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `Cookie` header in `headers`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::new();
        for value in headers.get_all(COOKIE) {
            if let Ok(raw) = value.to_str() {
                jar.extend_from_str(raw);
            }
        }
        jar
    }

    /// Parse a `name=value; name2=value2` header string. Malformed pairs are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut jar = Self::new();
        jar.extend_from_str(raw);
        jar
    }

    fn extend_from_str(&mut self, raw: &str) {
        for pair in raw.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            self.set(name, value.trim());
        }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.cookies.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.cookies.push(Cookie::new(name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.cookies.retain(|c| c.name != name);
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// Render as a single `Cookie` header string
    pub fn to_header_string(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl CookieReader for CookieJar {
    fn get_all(&self) -> Vec<Cookie> {
        self.cookies.clone()
    }

    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let jar = CookieJar::parse("a=1; b=two;c=3");
        assert_eq!(jar.len(), 3);
        assert_eq!(jar.get("b"), Some("two".to_string()));
        assert_eq!(jar.get("c"), Some("3".to_string()));
    }

    #[test]
    fn test_parse_skips_malformed_pairs() {
        let jar = CookieJar::parse("novalue; =empty; ok=1;;");
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("ok"), Some("1".to_string()));
    }

    #[test]
    fn test_value_kept_verbatim() {
        let jar = CookieJar::parse("token=\"abc=def\"");
        assert_eq!(jar.get("token"), Some("\"abc=def\"".to_string()));
    }

    #[test]
    fn test_from_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2"));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.to_header_string(), "a=1; b=2");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut jar = CookieJar::parse("a=1; b=2");
        jar.set("a", "9");
        jar.remove("b");
        assert_eq!(jar.to_header_string(), "a=9");
    }

    #[test]
    fn test_set_cookie_rendering() {
        let cookie = SetCookie::new(
            "sb-access-token",
            "abc.def.ghi",
            CookieOptions {
                path: Some("/".to_string()),
                domain: None,
                max_age: Some(3600),
                http_only: true,
                secure: true,
                same_site: Some(SameSite::Lax),
            },
        );
        assert_eq!(
            cookie.to_header_string(),
            "sb-access-token=abc.def.ghi; Path=/; Max-Age=3600; HttpOnly; Secure; SameSite=Lax"
        );
        assert!(cookie.to_header_value().is_some());
    }

    #[test]
    fn test_removal() {
        let cookie = SetCookie::removal("sb-refresh-token", CookieOptions::default());
        assert!(cookie.is_removal());
        assert_eq!(cookie.to_header_string(), "sb-refresh-token=; Max-Age=0");
    }

    #[test]
    fn test_well_formed() {
        let ok = SetCookie::new("name", "base64-eyJhIjoxfQ==", CookieOptions::default());
        assert!(ok.is_well_formed());

        let bad_name = SetCookie::new("", "v", CookieOptions::default());
        assert!(!bad_name.is_well_formed());

        let bad_value = SetCookie::new("name", "a;b", CookieOptions::default());
        assert!(!bad_value.is_well_formed());

        let newline = SetCookie::new("name", "a\nb", CookieOptions::default());
        assert!(!newline.is_well_formed());
    }

    #[test]
    fn test_quoted_value_well_formed() {
        let quoted = SetCookie::new("name", "\"abc\"", CookieOptions::default());
        assert!(quoted.is_well_formed());
        assert_eq!(quoted.to_header_string(), "name=\"abc\"");

        let empty_quotes = SetCookie::new("name", "\"\"", CookieOptions::default());
        assert!(empty_quotes.is_well_formed());

        for value in ["\"abc", "abc\"", "\"a\"b\"", "\"\"\"", "\"a b\""] {
            let cookie = SetCookie::new("name", value, CookieOptions::default());
            assert!(!cookie.is_well_formed(), "{}", value);
        }
    }

    #[test]
    fn test_same_site_from_config() {
        assert_eq!(SameSite::from_config("Strict"), SameSite::Strict);
        assert_eq!(SameSite::from_config("none"), SameSite::None);
        assert_eq!(SameSite::from_config("whatever"), SameSite::Lax);
    }
}
