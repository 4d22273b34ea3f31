use crate::crud::{EntityPage, EntitySpec, Selection};
use crate::entities;
use crate::error::{CrudError, FormError};
use crate::executor::WriteOutcome;
use crate::ipc::error::{err, ok, with_notices};
use crate::ipc::types::{AppState, Request};
use crate::notice::Notices;
use serde_json::{json, Map, Value};

fn to_json<T: serde::Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

fn page_spec<'a>(state: &'a AppState, req: &Request) -> Result<&'a EntitySpec, Value> {
    let Some(page) = req.params.get("page").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing params.page", None));
    };
    entities::find(&state.catalog, page).ok_or_else(|| {
        err(
            &req.id,
            "unknown_page",
            format!("unknown page: {page}"),
            Some(json!({ "page": page })),
        )
    })
}

/// A key tuple; a bare scalar stands for a single-column key.
fn key_tuple(v: &Value) -> Vec<Value> {
    match v {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn selection(req: &Request) -> Result<Selection, Value> {
    if let Some(key) = req.params.get("key").filter(|v| !v.is_null()) {
        return Ok(Selection::Key(key_tuple(key)));
    }
    match req.params.get("choice").and_then(|v| v.as_str()) {
        Some(label) => Ok(Selection::Label(label.to_string())),
        None => Err(err(
            &req.id,
            "bad_params",
            "missing params.key or params.choice",
            None,
        )),
    }
}

fn submitted_values(req: &Request) -> Result<Map<String, Value>, Value> {
    match req.params.get("values") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(m)) => Ok(m.clone()),
        Some(_) => Err(err(&req.id, "bad_params", "params.values must be an object", None)),
    }
}

fn crud_err(req: &Request, e: &CrudError, notices: &Notices) -> Value {
    let details = match e {
        CrudError::Db(db) => Some(json!({ "outcome": WriteOutcome::failed(db) })),
        CrudError::Form(FormError::Missing(fields)) => {
            Some(json!({ "missing": fields.split(", ").collect::<Vec<_>>() }))
        }
        _ => None,
    };
    with_notices(err(&req.id, e.code(), e.to_string(), details), notices)
}

/// Success payload shared by add, update and delete: the outcome plus the list
/// re-read after the commit.
fn written(
    page: &EntityPage<'_>,
    req: &Request,
    rows_affected: usize,
    generated: Map<String, Value>,
    verb: &str,
    mut notices: Notices,
) -> Value {
    notices.info(format!("{} {verb} successfully!", page.spec().entity));
    let list = page.list(&mut notices);
    with_notices(
        ok(
            &req.id,
            json!({
                "outcome": WriteOutcome::succeeded(rows_affected),
                "generated": generated,
                "list": to_json(&list),
            }),
        ),
        &notices,
    )
}

fn handle_open(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let mut notices = Notices::new();
    let view = EntityPage::new(spec, &state.executor).open(&mut notices);
    with_notices(ok(&req.id, to_json(&view)), &notices)
}

fn handle_list(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let mut notices = Notices::new();
    let list = EntityPage::new(spec, &state.executor).list(&mut notices);
    with_notices(ok(&req.id, to_json(&list)), &notices)
}

fn handle_choices(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let mut notices = Notices::new();
    let choices = EntityPage::new(spec, &state.executor).choices(&mut notices);
    if choices.is_empty() {
        notices.info(format!("No {} records found", spec.entity.to_lowercase()));
    }
    with_notices(ok(&req.id, json!({ "choices": to_json(&choices) })), &notices)
}

fn handle_add_form(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let mut notices = Notices::new();
    match EntityPage::new(spec, &state.executor).add_form(&mut notices) {
        Ok(fields) => with_notices(ok(&req.id, json!({ "fields": to_json(&fields) })), &notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

fn handle_add(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let values = match submitted_values(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page = EntityPage::new(spec, &state.executor);
    let mut notices = Notices::new();
    match page.add(&values, &mut notices) {
        Ok(report) => written(&page, req, report.rows_affected, report.generated, "added", notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

fn handle_update_form(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let selection = match selection(req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let page = EntityPage::new(spec, &state.executor);
    let mut notices = Notices::new();
    let view = page
        .resolve(&selection, &mut notices)
        .and_then(|key| page.update_form(&key, &mut notices));
    match view {
        Ok(view) => with_notices(ok(&req.id, to_json(&view)), &notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

fn handle_update(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let selection = match selection(req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let values = match submitted_values(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page = EntityPage::new(spec, &state.executor);
    let mut notices = Notices::new();
    let res = page
        .resolve(&selection, &mut notices)
        .and_then(|key| page.update(&key, &values, &mut notices));
    match res {
        Ok(report) => written(&page, req, report.rows_affected, report.generated, "updated", notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

fn handle_delete_preview(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let selection = match selection(req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let page = EntityPage::new(spec, &state.executor);
    let mut notices = Notices::new();
    let view = page
        .resolve(&selection, &mut notices)
        .and_then(|key| page.delete_preview(&key, &mut notices));
    match view {
        Ok(view) => with_notices(ok(&req.id, to_json(&view)), &notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

fn handle_delete(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let selection = match selection(req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let page = EntityPage::new(spec, &state.executor);
    let mut notices = Notices::new();
    let res = page
        .resolve(&selection, &mut notices)
        .and_then(|key| page.delete(&key));
    match res {
        Ok(report) => written(&page, req, report.rows_affected, report.generated, "deleted", notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

fn handle_delete_many(state: &AppState, req: &Request) -> Value {
    let spec = match page_spec(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(keys) = req.params.get("keys").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing params.keys", None);
    };
    let keys: Vec<Vec<Value>> = keys.iter().map(key_tuple).collect();

    let page = EntityPage::new(spec, &state.executor);
    let notices = Notices::new();
    match page.delete_many(&keys) {
        Ok(report) => written(&page, req, report.rows_affected, report.generated, "deleted", notices),
        Err(e) => crud_err(req, &e, &notices),
    }
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "entity.open" => Some(handle_open(state, req)),
        "entity.list" => Some(handle_list(state, req)),
        "entity.choices" => Some(handle_choices(state, req)),
        "entity.addForm" => Some(handle_add_form(state, req)),
        "entity.add" => Some(handle_add(state, req)),
        "entity.updateForm" => Some(handle_update_form(state, req)),
        "entity.update" => Some(handle_update(state, req)),
        "entity.deletePreview" => Some(handle_delete_preview(state, req)),
        "entity.delete" => Some(handle_delete(state, req)),
        "entity.deleteMany" => Some(handle_delete_many(state, req)),
        _ => None,
    }
}
