//! Route classification and static-asset exclusion

use regex::RegexSet;
use serde::Serialize;
use std::fmt;

use crate::config::GuardConfig;
use crate::error::Result;

/// Which side of the guard a path falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    /// No authenticated user required
    Public,
    /// Requires an authenticated user
    Protected,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteClass::Public => write!(f, "public"),
            RouteClass::Protected => write!(f, "protected"),
        }
    }
}

/// Compiled guard configuration
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    protected_prefix: String,
    login_path: String,
    exempt_paths: Vec<String>,
    exclude: RegexSet,
}

impl RoutePolicy {
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        Ok(Self {
            protected_prefix: config.protected_prefix.clone(),
            login_path: config.login_path.clone(),
            exempt_paths: config.exempt_paths.clone(),
            exclude: RegexSet::new(&config.exclude)?,
        })
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Static assets never reach the guard
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.is_match(path)
    }

    /// Plain prefix match, so `/admin/login` is protected unless exempted
    pub fn classify(&self, path: &str) -> RouteClass {
        if path.starts_with(&self.protected_prefix)
            && !self.exempt_paths.iter().any(|exempt| exempt == path)
        {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }
}
