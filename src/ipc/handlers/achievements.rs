use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::Category;
use crate::store::{AchievementFilter, NewAchievement};
use serde_json::json;

fn parse_filter(params: &serde_json::Value) -> Result<AchievementFilter, String> {
    let student_id = params
        .get("studentId")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let category = match params.get("category").and_then(|v| v.as_str()) {
        Some(raw) => Some(raw.parse::<Category>()?),
        None => None,
    };
    Ok(AchievementFilter {
        student_id,
        category,
    })
}

fn handle_achievements_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let filter = match parse_filter(&req.params) {
        Ok(f) => f,
        Err(e) => return err(&req.id, "bad_params", e, None),
    };
    match serde_json::to_value(store.list_achievements(&filter)) {
        Ok(achievements) => ok(&req.id, json!({ "achievements": achievements })),
        Err(e) => err(&req.id, "storage_failed", e.to_string(), None),
    }
}

fn handle_achievements_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let new: NewAchievement = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    match store.add_achievement(new) {
        Ok(achievement) => ok(&req.id, json!({ "achievement": achievement })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "achievements.list" => Some(handle_achievements_list(state, req)),
        "achievements.create" => Some(handle_achievements_create(state, req)),
        _ => None,
    }
}
