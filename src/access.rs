use crate::model::{CurrentUser, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Both the missing-session and wrong-role cases land on the login view;
    /// there is no separate "unauthorized" target.
    RedirectToLogin,
}

/// Pure role gate. The shell calls this on every navigation into a protected
/// view; the result is never cached.
pub fn check_access(user: Option<&CurrentUser>, required: Role) -> AccessDecision {
    match user {
        Some(u) if u.role == required => AccessDecision::Allow,
        _ => AccessDecision::RedirectToLogin,
    }
}
