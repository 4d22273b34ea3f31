use crate::entities::DASHBOARD_PAGE;
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "database": state.executor.config().database,
        }),
    )
}

fn handle_pages_list(state: &AppState, req: &Request) -> serde_json::Value {
    let mut pages = vec![json!({ "page": DASHBOARD_PAGE, "kind": "dashboard" })];
    pages.extend(state.catalog.iter().map(|spec| {
        let mut caps = spec.capabilities();
        caps["kind"] = json!("entity");
        caps
    }));
    ok(&req.id, json!({ "pages": pages }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "pages.list" => Some(handle_pages_list(state, req)),
        _ => None,
    }
}
