//! Render/redirect decisions for guarded views and the console route table.

use serde::Serialize;

use crate::models::{AuthState, Role};

/// Entry points a guard can send the operator to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Navigation {
    SignIn,
    Landing,
}

impl Navigation {
    pub const fn path(self) -> &'static str {
        match self {
            Navigation::SignIn => "/login",
            Navigation::Landing => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth state not known yet; show a neutral waiting indicator.
    Wait,
    Redirect(Navigation),
    Render,
}

/// Decides whether a view requiring one of `required` may render.
/// An empty `required` set admits any authenticated role.
pub fn authorize(state: &AuthState, required: &[Role]) -> GuardDecision {
    match state {
        AuthState::Loading => GuardDecision::Wait,
        AuthState::Anonymous => GuardDecision::Redirect(Navigation::SignIn),
        AuthState::Authenticated { role: None, .. } => GuardDecision::Wait,
        AuthState::Authenticated {
            role: Some(role), ..
        } => {
            if required.is_empty() || required.contains(role) {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect(Navigation::Landing)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable in any state (health, metrics).
    Public,
    /// Sign-in and sign-up: authenticated visitors go to the landing view.
    AnonymousOnly,
    /// Requires a session holding one of the listed roles (empty = any).
    Authenticated(&'static [Role]),
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    pub path: &'static str,
    /// Also matches every path below `path`.
    pub nested: bool,
    pub access: Access,
}

fn rule(path: &'static str, nested: bool, access: Access) -> RouteRule {
    RouteRule {
        path,
        nested,
        access,
    }
}

impl RouteRule {
    fn matches(&self, path: &str) -> bool {
        if path == self.path {
            return true;
        }
        self.nested
            && path
                .strip_prefix(self.path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

const ANY_ROLE: &[Role] = &[];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Routes served by the operator console.
    pub fn console() -> Self {
        Self::new(vec![
            rule("/health", false, Access::Public),
            rule("/metrics", false, Access::Public),
            rule("/login", false, Access::AnonymousOnly),
            rule("/signup", false, Access::AnonymousOnly),
            rule("/", false, Access::Authenticated(ANY_ROLE)),
            rule("/feedback", false, Access::Authenticated(ANY_ROLE)),
            rule("/logout", false, Access::Authenticated(ANY_ROLE)),
            rule("/session", false, Access::Authenticated(ANY_ROLE)),
            rule("/dashboard", true, Access::Authenticated(ADMIN_ONLY)),
        ])
    }

    pub fn access(&self, path: &str) -> Option<Access> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.access)
    }

    pub fn decide(&self, path: &str, state: &AuthState) -> GuardDecision {
        match self.access(path) {
            Some(Access::Public) => GuardDecision::Render,
            Some(Access::AnonymousOnly) => match state {
                AuthState::Loading => GuardDecision::Wait,
                AuthState::Anonymous => GuardDecision::Render,
                AuthState::Authenticated { .. } => GuardDecision::Redirect(Navigation::Landing),
            },
            Some(Access::Authenticated(required)) => authorize(state, required),
            None => match state {
                AuthState::Loading => GuardDecision::Wait,
                AuthState::Anonymous => GuardDecision::Redirect(Navigation::SignIn),
                AuthState::Authenticated { .. } => GuardDecision::Redirect(Navigation::Landing),
            },
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::console()
    }
}
