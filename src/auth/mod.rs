//! Session cookies and the hosted auth service

pub mod backend;
pub mod cookies;
pub mod hosted;
pub mod jwt;
pub mod session;

pub use backend::{resolve_user, AuthBackend, AuthUser, UserLookup};
pub use cookies::{Cookie, CookieJar, CookieOptions, CookieReader, CookieWriter, SameSite, SetCookie};
pub use hosted::{HostedAuthClient, RefreshOutcome, TokenGrant};
pub use jwt::{peek_claims, verify_token, AccessClaims};
pub use session::{SessionContext, SessionTokens};
