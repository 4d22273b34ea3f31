mod test_support;

use serde_json::json;
use std::io::Write;
use test_support::{
    db_path, error_code, read_response, request, request_err, request_ok, spawn_sidecar, temp_dir,
};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("unidash-router-smoke");
    let database = db_path(&workspace);
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&database);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health.get("database").and_then(|v| v.as_str()),
        Some(database.to_string_lossy().as_ref())
    );
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());

    let pages = request_ok(&mut stdin, &mut reader, "2", "pages.list", json!({}));
    let names: Vec<&str> = pages["pages"]
        .as_array()
        .expect("pages")
        .iter()
        .filter_map(|p| p.get("page").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            "Dashboard",
            "Students",
            "Courses",
            "Faculty",
            "Departments",
            "Enrollments",
            "Sections",
            "Library"
        ]
    );
    assert_eq!(pages["pages"][5]["keyColumns"], json!(["student_id", "section_id"]));

    let _ = request_ok(&mut stdin, &mut reader, "3", "dashboard.get", json!({}));

    for (i, page) in names.iter().skip(1).enumerate() {
        let id = format!("open-{i}");
        let view = request_ok(&mut stdin, &mut reader, &id, "entity.open", json!({ "page": page }));
        assert!(view.get("list").is_some(), "{page}: {view}");
        assert!(view.get("addForm").is_some(), "{page}: {view}");
        assert_eq!(view["choices"], json!([]), "{page}");
    }

    let resp = request(&mut stdin, &mut reader, "4", "nope.method", json!({}));
    assert_eq!(error_code(&resp), "not_implemented");

    let resp = request_err(&mut stdin, &mut reader, "5", "entity.list", json!({ "page": "Parking" }));
    assert_eq!(error_code(&resp), "unknown_page");

    let resp = request_err(&mut stdin, &mut reader, "6", "entity.list", json!({}));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "entity.updateForm",
        json!({ "page": "Courses" }),
    );
    assert_eq!(error_code(&resp), "bad_params");

    // A malformed line is answered without an id and the loop keeps going.
    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(error_code(&resp), "bad_json");

    let _ = request_ok(&mut stdin, &mut reader, "8", "health", json!({}));

    drop(stdin);
    let _ = child.wait();
}
