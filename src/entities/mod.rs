mod academics;
mod library;
mod people;

use crate::crud::EntitySpec;

pub const DASHBOARD_PAGE: &str = "Dashboard";

/// Entity pages in navigation order.
pub fn catalog() -> Vec<EntitySpec> {
    vec![
        people::students(),
        academics::courses(),
        people::faculty(),
        academics::departments(),
        academics::enrollments(),
        academics::sections(),
        library::books(),
    ]
}

/// Look a page up by its navigation name or entity name.
pub fn find<'a>(catalog: &'a [EntitySpec], page: &str) -> Option<&'a EntitySpec> {
    let page = page.trim();
    catalog
        .iter()
        .find(|s| s.page.eq_ignore_ascii_case(page) || s.entity.eq_ignore_ascii_case(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependent::{Bind, Bindings, Step, WritePlan};
    use crate::forms::{FieldKind, FormValues, SelectSource};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn bindings(spec: &EntitySpec, values: Vec<Value>, keys: Vec<Value>) -> Bindings {
        assert_eq!(spec.fields.len(), values.len(), "{} field count", spec.entity);
        let fields: FormValues = spec.fields.iter().map(|f| f.name).zip(values).collect();
        Bindings { fields, keys }
    }

    fn first_statement_params(plan: &WritePlan, b: &Bindings) -> Vec<Value> {
        let captured = HashMap::from([("person_id", json!(500))]);
        plan.steps
            .iter()
            .find_map(|s| match s {
                Step::Execute { binds, .. } => Some(b.resolve(binds, &captured).expect("resolve")),
                _ => None,
            })
            .expect("plan has a statement")
    }

    #[test]
    fn pages_follow_navigation_order() {
        let cat = catalog();
        let pages: Vec<&str> = cat.iter().map(|s| s.page).collect();
        assert_eq!(
            pages,
            vec!["Students", "Courses", "Faculty", "Departments", "Enrollments", "Sections", "Library"]
        );
        assert_eq!(find(&cat, "library book").map(|s| s.page), Some("Library"));
        assert!(find(&cat, DASHBOARD_PAGE).is_none());
    }

    #[test]
    fn update_params_are_fields_then_keys() {
        let cat = catalog();
        let cases: Vec<(&str, Vec<Value>, Vec<Value>, Vec<Value>)> = vec![
            (
                "Courses",
                vec![json!("Compilers"), json!(4), json!("Front to back"), json!(2)],
                vec![json!(7)],
                vec![json!("Compilers"), json!(4), json!("Front to back"), json!(2), json!(7)],
            ),
            (
                "Enrollments",
                vec![json!(3), json!(10), json!("2025-09-01")],
                vec![json!(3), json!(9)],
                vec![json!(3), json!(10), json!("2025-09-01"), json!(3), json!(9)],
            ),
            (
                "Sections",
                vec![json!(1), json!("Fall"), json!(2025), json!("B12"), json!(4)],
                vec![json!(6)],
                vec![json!(1), json!("Fall"), json!(2025), json!("B12"), json!(4), json!(6)],
            ),
            (
                "Departments",
                vec![json!("Math"), json!("Hall"), json!(5000), Value::Null],
                vec![json!(2)],
                vec![json!("Math"), json!("Hall"), json!(5000), Value::Null, json!(2)],
            ),
            (
                "Students",
                vec![
                    json!("Ada"),
                    json!("Lovelace"),
                    json!("1815-12-10"),
                    json!("Female"),
                    json!("555"),
                    json!("ada@example.edu"),
                    json!("2025-09-01"),
                    json!("Active"),
                    json!(1),
                ],
                vec![json!(12)],
                vec![
                    json!("Ada"),
                    json!("Lovelace"),
                    json!("1815-12-10"),
                    json!("Female"),
                    json!("555"),
                    json!("ada@example.edu"),
                    json!(12),
                ],
            ),
        ];

        for (page, values, keys, expected) in cases {
            let spec = find(&cat, page).expect(page);
            let plan = spec.update.as_ref().expect("update plan");
            let b = bindings(spec, values, keys);
            assert_eq!(first_statement_params(plan, &b), expected, "{page}");
        }
    }

    #[test]
    fn every_statement_binds_one_value_per_placeholder() {
        let cat = catalog();
        for spec in &cat {
            let values = vec![Value::Null; spec.fields.len()];
            let keys = vec![Value::Null; spec.key_columns().len()];
            let b = bindings(spec, values, keys);
            let captured = HashMap::from([("person_id", json!(1))]);

            let plans = [spec.insert.clone(), spec.update.clone(), spec.delete_plan()];
            for plan in plans.iter().flatten() {
                for step in &plan.steps {
                    let (sql, binds): (&str, &Vec<Bind>) = match step {
                        Step::Guard(g) => (g.sql, &g.binds),
                        Step::Lookup { sql, binds, .. } => (*sql, binds),
                        Step::Execute { sql, binds, .. } => (*sql, binds),
                    };
                    let params = b.resolve(binds, &captured).expect("resolve");
                    assert_eq!(
                        sql.matches('?').count(),
                        params.len(),
                        "{}: {}",
                        spec.entity,
                        sql
                    );
                }
            }
        }
    }

    #[test]
    fn only_faculty_declares_a_delete_guard() {
        let cat = catalog();
        let guarded: Vec<&str> = cat
            .iter()
            .filter(|s| !s.delete_guards.is_empty())
            .map(|s| s.entity)
            .collect();
        assert_eq!(guarded, vec!["Faculty"]);
    }

    #[test]
    fn inner_joined_lookups_are_required() {
        let cat = catalog();
        let required_selects = |page: &str| -> Vec<&'static str> {
            find(&cat, page)
                .expect(page)
                .fields
                .iter()
                .filter(|f| f.required && matches!(f.kind, FieldKind::Select(SelectSource::Lookup { .. })))
                .map(|f| f.name)
                .collect()
        };
        assert_eq!(required_selects("Courses"), vec!["dept_id"]);
        assert_eq!(required_selects("Sections"), vec!["course_id", "faculty_id"]);
        assert_eq!(required_selects("Enrollments"), vec!["student_id", "section_id"]);
        assert_eq!(required_selects("Library"), vec!["facility_id"]);
        assert!(required_selects("Departments").is_empty());
        assert!(required_selects("Students").is_empty());
        assert!(required_selects("Faculty").is_empty());
    }
}
