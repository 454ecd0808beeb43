//! Route guard
//!
//! Decides whether a page navigation may proceed given whether the visitor
//! has a session. Paths are matched by plain string prefix, so `/course`
//! also covers `/courses/abc`.

use crate::config::GuardConfig;

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected_prefixes: Vec<String>,
    guest_only_exact: Vec<String>,
    guest_only_prefixes: Vec<String>,
    home_path: String,
    login_path: String,
}

impl RouteGuard {
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn is_guest_only(&self, path: &str) -> bool {
        self.guest_only_exact.iter().any(|p| path == p)
            || self.guest_only_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Redirect signed-in visitors away from guest pages and anonymous
    /// visitors away from protected ones.
    pub fn decide(&self, path: &str, has_session: bool) -> GuardDecision {
        if has_session && self.is_guest_only(path) {
            GuardDecision::Redirect(self.home_path.clone())
        } else if !has_session && self.is_protected(path) {
            GuardDecision::Redirect(self.login_path.clone())
        } else {
            GuardDecision::Allow
        }
    }

    /// Whether the decision for `path` can change with session presence
    pub fn depends_on_session(&self, path: &str) -> bool {
        self.decide(path, true) != self.decide(path, false)
    }
}

impl From<&GuardConfig> for RouteGuard {
    fn from(config: &GuardConfig) -> Self {
        Self {
            protected_prefixes: config.protected_prefixes.clone(),
            guest_only_exact: config.guest_only_exact.clone(),
            guest_only_prefixes: config.guest_only_prefixes.clone(),
            home_path: config.home_path.clone(),
            login_path: config.login_path.clone(),
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::from(&GuardConfig::default())
    }
}
