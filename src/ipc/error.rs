use serde_json::json;

use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Map the store's typed failures onto stable wire codes.
pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    match e {
        StoreError::Validation(_) => err(id, "validation_failed", e.to_string(), None),
        StoreError::UnknownStudent(student_id) => err(
            id,
            "unknown_student",
            e.to_string(),
            Some(json!({ "studentId": student_id })),
        ),
        StoreError::Storage { slot, .. } => err(
            id,
            "storage_failed",
            e.to_string(),
            Some(json!({ "slot": slot })),
        ),
    }
}
