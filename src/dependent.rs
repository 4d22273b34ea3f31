//! Multi-statement writes that run inside one transaction.
//!
//! A [`WritePlan`] is an ordered list of steps. Later statements can bind values
//! produced by earlier ones (a generated row id, or a looked-up parent key), which
//! is how a child row is written against the parent row created just before it.

use crate::error::DbError;
use crate::executor::{from_sql, to_sql, Executor};
use crate::forms::{insert_params, FormValues};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    /// Every form value, in descriptor order.
    Fields,
    Field(&'static str),
    /// The key tuple, in key-column order.
    Keys,
    /// A value bound by an earlier `Lookup` or `Execute` capture.
    Captured(&'static str),
}

/// Aborts the plan when its count query returns a non-zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    pub sql: &'static str,
    pub binds: Vec<Bind>,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Guard(Guard),
    Lookup {
        sql: &'static str,
        binds: Vec<Bind>,
        bind_as: &'static str,
        missing: &'static str,
    },
    Execute {
        sql: &'static str,
        binds: Vec<Bind>,
        capture: Option<&'static str>,
    },
}

impl Step {
    pub fn execute(sql: &'static str, binds: Vec<Bind>) -> Self {
        Step::Execute {
            sql,
            binds,
            capture: None,
        }
    }

    pub fn execute_capturing(sql: &'static str, binds: Vec<Bind>, capture: &'static str) -> Self {
        Step::Execute {
            sql,
            binds,
            capture: Some(capture),
        }
    }

    pub fn lookup(
        sql: &'static str,
        binds: Vec<Bind>,
        bind_as: &'static str,
        missing: &'static str,
    ) -> Self {
        Step::Lookup {
            sql,
            binds,
            bind_as,
            missing,
        }
    }
}

/// Values available to a plan's binds.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub fields: FormValues,
    pub keys: Vec<Value>,
}

impl Bindings {
    pub fn fields(fields: FormValues) -> Self {
        Self {
            fields,
            keys: Vec::new(),
        }
    }

    pub fn keys(keys: Vec<Value>) -> Self {
        Self {
            fields: FormValues::new(),
            keys,
        }
    }

    pub fn resolve(
        &self,
        binds: &[Bind],
        captured: &HashMap<&'static str, Value>,
    ) -> Result<Vec<Value>, DbError> {
        let mut params = Vec::new();
        for bind in binds {
            match bind {
                Bind::Fields => params.extend(insert_params(&self.fields)),
                Bind::Field(name) => params.push(
                    self.fields
                        .get(name)
                        .cloned()
                        .ok_or_else(|| DbError::NotFound(format!("value for field '{name}'")))?,
                ),
                Bind::Keys => params.extend(self.keys.iter().cloned()),
                Bind::Captured(name) => params.push(
                    captured
                        .get(name)
                        .cloned()
                        .ok_or_else(|| DbError::NotFound(format!("bound value '{name}'")))?,
                ),
            }
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub rows_affected: usize,
    /// Row ids captured by `Execute` steps, by capture name.
    pub generated: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WritePlan {
    pub steps: Vec<Step>,
}

impl WritePlan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// One statement bound to the form values.
    pub fn insert(sql: &'static str) -> Self {
        Self::new(vec![Step::execute(sql, vec![Bind::Fields])])
    }

    /// One statement bound to the form values, then the key tuple.
    pub fn update(sql: &'static str) -> Self {
        Self::new(vec![Step::execute(sql, vec![Bind::Fields, Bind::Keys])])
    }

    /// One statement bound to the key tuple.
    pub fn delete(sql: &'static str) -> Self {
        Self::new(vec![Step::execute(sql, vec![Bind::Keys])])
    }

    /// The same plan with `guards` checked before any other step.
    pub fn guarded(&self, guards: &[Guard]) -> Self {
        let mut steps: Vec<Step> = guards.iter().cloned().map(Step::Guard).collect();
        steps.extend(self.steps.iter().cloned());
        Self::new(steps)
    }

    /// The statement text when the plan is a single key-bound statement, so it
    /// can run in batch mode.
    pub fn key_only_statement(&self) -> Option<&'static str> {
        match self.steps.as_slice() {
            [Step::Execute {
                sql,
                binds,
                capture: None,
            }] if matches!(binds.as_slice(), [Bind::Keys]) => Some(*sql),
            _ => None,
        }
    }

    pub fn run(&self, conn: &Connection, bindings: &Bindings) -> Result<PlanReport, DbError> {
        let mut captured: HashMap<&'static str, Value> = HashMap::new();
        let mut report = PlanReport::default();

        for step in &self.steps {
            match step {
                Step::Guard(guard) => {
                    let params = bindings.resolve(&guard.binds, &captured)?;
                    let count: i64 = conn.query_row(
                        guard.sql,
                        params_from_iter(params.iter().map(to_sql)),
                        |r| r.get(0),
                    )?;
                    if count > 0 {
                        tracing::info!(count, "write blocked by guard");
                        return Err(DbError::Blocked(guard.message.to_string()));
                    }
                }
                Step::Lookup {
                    sql,
                    binds,
                    bind_as,
                    missing,
                } => {
                    let params = bindings.resolve(binds, &captured)?;
                    let found = conn
                        .query_row(sql, params_from_iter(params.iter().map(to_sql)), |r| {
                            Ok(from_sql(r.get_ref(0)?))
                        })
                        .optional()?;
                    match found {
                        Some(v) => {
                            captured.insert(*bind_as, v);
                        }
                        None => return Err(DbError::NotFound(missing.to_string())),
                    }
                }
                Step::Execute {
                    sql,
                    binds,
                    capture,
                } => {
                    let params = bindings.resolve(binds, &captured)?;
                    report.rows_affected +=
                        conn.execute(sql, params_from_iter(params.iter().map(to_sql)))?;
                    if let Some(name) = capture {
                        let id = Value::from(conn.last_insert_rowid());
                        captured.insert(*name, id.clone());
                        report.generated.insert(name.to_string(), id);
                    }
                }
            }
        }
        Ok(report)
    }

    /// Run the plan once per binding set, all inside one transaction.
    pub fn apply(&self, executor: &Executor, sets: &[Bindings]) -> Result<PlanReport, DbError> {
        executor.transaction(|tx| {
            let mut total = PlanReport::default();
            for bindings in sets {
                let report = self.run(tx, bindings)?;
                total.rows_affected += report.rows_affected;
                total.generated.extend(report.generated);
            }
            Ok(total)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::bootstrapped;
    use serde_json::json;

    fn count(exec: &Executor, table: &str) -> i64 {
        let rows = exec
            .try_read(&format!("SELECT COUNT(*) AS n FROM {table}"), &[])
            .expect("count");
        rows[0]["n"].as_i64().expect("n")
    }

    fn person_then(child_sql: &'static str) -> WritePlan {
        WritePlan::new(vec![
            Step::execute_capturing(
                "INSERT INTO Person(first_name, last_name, person_type) VALUES(?, ?, 'Student')",
                vec![Bind::Field("first_name"), Bind::Field("last_name")],
                "person_id",
            ),
            Step::execute(
                child_sql,
                vec![Bind::Captured("person_id"), Bind::Field("status")],
            ),
        ])
    }

    fn student_values(status: &str) -> Bindings {
        let mut fields = FormValues::new();
        fields.insert("first_name", json!("Grace"));
        fields.insert("last_name", json!("Hopper"));
        fields.insert("status", json!(status));
        Bindings::fields(fields)
    }

    #[test]
    fn binds_resolve_fields_then_keys() {
        let mut fields = FormValues::new();
        fields.insert("student_id", json!(4));
        fields.insert("section_id", json!(11));
        fields.insert("enrollment_date", json!("2025-09-01"));
        let bindings = Bindings {
            fields,
            keys: vec![json!(3), json!(10)],
        };
        let params = bindings
            .resolve(&[Bind::Fields, Bind::Keys], &HashMap::new())
            .expect("resolve");
        assert_eq!(
            params,
            vec![json!(4), json!(11), json!("2025-09-01"), json!(3), json!(10)]
        );

        let err = bindings
            .resolve(&[Bind::Captured("person_id")], &HashMap::new())
            .expect_err("nothing captured yet");
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn child_row_uses_generated_parent_id() {
        let exec = bootstrapped("unidash-plan-capture");
        let plan = person_then("INSERT INTO Student(person_id, status) VALUES(?, ?)");
        let report = plan
            .apply(&exec, &[student_values("Active")])
            .expect("apply");
        assert_eq!(report.rows_affected, 2);
        let person_id = report.generated["person_id"].clone();

        let rows = exec
            .try_read("SELECT person_id, status FROM Student", &[])
            .expect("read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["person_id"], person_id);
    }

    #[test]
    fn failing_second_statement_rolls_back_parent() {
        let exec = bootstrapped("unidash-plan-rollback");
        let plan = person_then("INSERT INTO Student(person_id, status) VALUES(?, ?)");
        let err = plan
            .apply(&exec, &[student_values("Expelled")])
            .expect_err("status check must fail");
        assert!(matches!(err, DbError::Statement(_)));
        assert_eq!(count(&exec, "Person"), 0);
        assert_eq!(count(&exec, "Student"), 0);
    }

    #[test]
    fn guard_blocks_before_any_write() {
        let exec = bootstrapped("unidash-plan-guard");
        exec.write("INSERT INTO Grade(letter_grade) VALUES('A')", &[]);

        let plan = WritePlan::delete("DELETE FROM Grade WHERE grade_id = ?").guarded(&[Guard {
            sql: "SELECT COUNT(*) FROM Grade WHERE grade_id = ?",
            binds: vec![Bind::Keys],
            message: "grade still exists",
        }]);
        assert_eq!(plan.key_only_statement(), None);

        let err = plan
            .apply(&exec, &[Bindings::keys(vec![json!(1)])])
            .expect_err("blocked");
        assert_eq!(err.to_string(), "grade still exists");
        assert_eq!(count(&exec, "Grade"), 1);
    }

    #[test]
    fn lookup_without_row_is_not_found() {
        let exec = bootstrapped("unidash-plan-lookup");
        let plan = WritePlan::new(vec![
            Step::lookup(
                "SELECT person_id FROM Student WHERE student_id = ?",
                vec![Bind::Keys],
                "person_id",
                "Student",
            ),
            Step::execute(
                "DELETE FROM Person WHERE person_id = ?",
                vec![Bind::Captured("person_id")],
            ),
        ]);
        let err = plan
            .apply(&exec, &[Bindings::keys(vec![json!(99)])])
            .expect_err("missing");
        assert_eq!(err.to_string(), "Student not found");
    }

    #[test]
    fn single_key_statement_is_batchable() {
        let plan = WritePlan::delete("DELETE FROM Course WHERE course_id = ?");
        assert_eq!(
            plan.key_only_statement(),
            Some("DELETE FROM Course WHERE course_id = ?")
        );
        assert_eq!(WritePlan::insert("INSERT INTO Grade(letter_grade) VALUES(?)").key_only_statement(), None);
    }
}
