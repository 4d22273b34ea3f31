use crate::dashboard;
use crate::ipc::error::{ok, with_notices};
use crate::ipc::types::{AppState, Request};
use crate::notice::Notices;
use serde_json::json;

fn handle_dashboard_get(state: &AppState, req: &Request) -> serde_json::Value {
    let mut notices = Notices::new();
    let view = dashboard::load(&state.executor, &mut notices);
    let result = serde_json::to_value(&view).unwrap_or_else(|_| json!({}));
    with_notices(ok(&req.id, result), &notices)
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.get" => Some(handle_dashboard_get(state, req)),
        _ => None,
    }
}
