use crate::notice::Notices;
use serde_json::json;

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

/// Attach the notices collected while serving a request, if there are any.
pub fn with_notices(mut resp: serde_json::Value, notices: &Notices) -> serde_json::Value {
    if !notices.is_empty() {
        resp["notices"] = notices.to_json();
    }
    resp
}
