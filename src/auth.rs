use log::{debug, info};
use rand::Rng;
use thiserror::Error;

use crate::model::{CurrentUser, Role};
use crate::store::Store;

pub const CAPTCHA_LEN: usize = 6;
// Alphanumerics minus the lookalikes 0/O, 1/I/l.
const CAPTCHA_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("captcha does not match")]
    CaptchaMismatch,
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Admin logins are not checked against any stored record: every non-empty
/// email/password pair is accepted and a principal is synthesized on the spot.
/// That is the portal's shipped behavior, kept intact; this type is the one
/// place to swap in a real check.
#[derive(Debug, Default)]
pub struct AdminBypassPolicy;

impl AdminBypassPolicy {
    pub fn authorize(&self, email: &str, password: &str) -> Option<CurrentUser> {
        if email.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(CurrentUser::for_admin(email.trim()))
    }
}

/// Login gate plus the single live session. Captcha codes are single-use: any
/// login attempt consumes the active code, and every failure issues a fresh
/// one.
pub struct AuthGate {
    captcha: Option<String>,
    session: Option<CurrentUser>,
    admin_policy: AdminBypassPolicy,
}

impl AuthGate {
    pub fn new() -> Self {
        Self {
            captcha: None,
            session: None,
            admin_policy: AdminBypassPolicy,
        }
    }

    /// Generate a fresh code, replacing whatever was active.
    pub fn issue_captcha(&mut self) -> &str {
        let mut rng = rand::thread_rng();
        let code: String = (0..CAPTCHA_LEN)
            .map(|_| CAPTCHA_CHARS[rng.gen_range(0..CAPTCHA_CHARS.len())] as char)
            .collect();
        self.captcha.insert(code).as_str()
    }

    pub fn current_captcha(&self) -> Option<&str> {
        self.captcha.as_deref()
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.session.as_ref()
    }

    pub fn attempt_login(
        &mut self,
        store: &Store,
        role: Role,
        email: &str,
        password: &str,
        captcha_input: &str,
    ) -> Result<CurrentUser, AuthError> {
        // Consume the active code whatever happens next.
        let expected = self.captcha.take();
        if expected.as_deref() != Some(captcha_input) {
            self.issue_captcha();
            return Err(AuthError::CaptchaMismatch);
        }

        let user = match role {
            Role::Student => match store.find_student_by_credentials(email, password) {
                Some(student) => CurrentUser::for_student(student),
                None => {
                    debug!("rejected student login for {}", email);
                    self.issue_captcha();
                    return Err(AuthError::InvalidCredentials);
                }
            },
            Role::Admin => match self.admin_policy.authorize(email, password) {
                Some(user) => user,
                None => {
                    self.issue_captcha();
                    return Err(AuthError::InvalidCredentials);
                }
            },
        };

        info!("{} session opened for {}", user.role, user.email);
        self.session = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.session.take() {
            info!("{} session closed for {}", user.role, user.email);
        }
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}
