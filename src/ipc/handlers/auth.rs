use crate::access::{check_access, AccessDecision};
use crate::auth::AuthError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn handle_captcha_issue(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "captcha": state.auth.issue_captcha() }))
}

fn handle_auth_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let role = match req.params.get("role").and_then(|v| v.as_str()) {
        Some(v) => match v.parse::<Role>() {
            Ok(r) => r,
            Err(e) => return err(&req.id, "bad_params", e, None),
        },
        None => return err(&req.id, "bad_params", "missing role", None),
    };
    let email = req
        .params
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let captcha_input = req
        .params
        .get("captchaInput")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    match state
        .auth
        .attempt_login(store, role, email, password, captcha_input)
    {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => {
            // A fresh code is already active; hand it back so the login view
            // can re-render without a second round trip.
            let details = state
                .auth
                .current_captcha()
                .map(|c| json!({ "captcha": c }));
            let code = match e {
                AuthError::CaptchaMismatch => "captcha_mismatch",
                AuthError::InvalidCredentials => "invalid_credentials",
            };
            err(&req.id, code, e.to_string(), details)
        }
    }
}

fn handle_auth_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.auth.logout();
    ok(&req.id, json!({}))
}

fn handle_auth_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let required = match req.params.get("requiredRole").and_then(|v| v.as_str()) {
        Some(v) => match v.parse::<Role>() {
            Ok(r) => r,
            Err(e) => return err(&req.id, "bad_params", e, None),
        },
        None => return err(&req.id, "bad_params", "missing requiredRole", None),
    };

    match check_access(state.auth.current_user(), required) {
        AccessDecision::Allow => ok(
            &req.id,
            json!({ "allowed": true, "user": state.auth.current_user() }),
        ),
        AccessDecision::RedirectToLogin => {
            ok(&req.id, json!({ "allowed": false, "redirect": "login" }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "captcha.issue" => Some(handle_captcha_issue(state, req)),
        "auth.login" => Some(handle_auth_login(state, req)),
        "auth.logout" => Some(handle_auth_logout(state, req)),
        "auth.check" => Some(handle_auth_check(state, req)),
        _ => None,
    }
}
