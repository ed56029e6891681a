use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::{NewParticipation, ParticipationFilter};
use serde_json::json;

fn handle_participations_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let filter = ParticipationFilter {
        student_id: req
            .params
            .get("studentId")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    };
    match serde_json::to_value(store.list_participations(&filter)) {
        Ok(participations) => ok(&req.id, json!({ "participations": participations })),
        Err(e) => err(&req.id, "storage_failed", e.to_string(), None),
    }
}

fn handle_participations_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let new: NewParticipation = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    match store.add_participation(new) {
        Ok(participation) => ok(&req.id, json!({ "participation": participation })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "participations.list" => Some(handle_participations_list(state, req)),
        "participations.create" => Some(handle_participations_create(state, req)),
        _ => None,
    }
}
