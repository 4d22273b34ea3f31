use crate::config::DatabaseConfig;
use crate::db;
use crate::error::DbError;
use crate::notice::Notices;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Transaction};
use serde::Serialize;
use serde_json::Value;

/// One result row: column name to value, in select-list order.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub success: bool,
    pub message: String,
    pub rows_affected: usize,
}

impl WriteOutcome {
    pub fn succeeded(rows_affected: usize) -> Self {
        Self {
            success: true,
            message: "Operation completed successfully".to_string(),
            rows_affected,
        }
    }

    pub fn failed(e: &DbError) -> Self {
        let message = match e {
            DbError::Connect(_) => "Connection failed".to_string(),
            other => other.to_string(),
        };
        Self {
            success: false,
            message,
            rows_affected: 0,
        }
    }

    fn from_result(res: Result<usize, DbError>) -> Self {
        match res {
            Ok(n) => Self::succeeded(n),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Runs statements against a fresh connection per call.
pub struct Executor {
    config: DatabaseConfig,
}

impl Executor {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn connect(&self) -> Result<Connection, DbError> {
        db::connect(&self.config)
    }

    pub fn try_read(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        let conn = self.connect()?;
        query_rows(&conn, sql, params).map_err(DbError::Statement)
    }

    /// Read rows, degrading to an empty result. The failure is reported through `notices`.
    pub fn read(&self, sql: &str, params: &[Value], notices: &mut Notices) -> Vec<Row> {
        match self.try_read(sql, params) {
            Ok(rows) => rows,
            Err(DbError::Statement(e)) => {
                tracing::warn!(error = %e, "query failed");
                notices.error(format!("Database query error: {e}"));
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "query not attempted");
                notices.error(e.to_string());
                Vec::new()
            }
        }
    }

    pub fn write(&self, sql: &str, params: &[Value]) -> WriteOutcome {
        WriteOutcome::from_result(self.try_write_batch(sql, std::slice::from_ref(&params.to_vec())))
    }

    /// Apply one statement per parameter tuple inside a single transaction.
    pub fn write_batch(&self, sql: &str, batch: &[Vec<Value>]) -> WriteOutcome {
        WriteOutcome::from_result(self.try_write_batch(sql, batch))
    }

    pub fn try_write_batch(&self, sql: &str, batch: &[Vec<Value>]) -> Result<usize, DbError> {
        self.transaction(|tx| {
            let mut stmt = tx.prepare(sql)?;
            let mut affected = 0;
            for params in batch {
                affected += stmt.execute(params_from_iter(params.iter().map(to_sql)))?;
            }
            Ok(affected)
        })
    }

    /// Run `f` inside one transaction: commit on `Ok`, roll back on `Err`.
    /// The connection is dropped before returning on every path.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(v) => {
                tx.commit()?;
                Ok(v)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rolling back");
                if let Err(rb) = tx.rollback() {
                    tracing::warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

pub fn query_rows(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(|c| c.to_string())
        .collect();
    let rows = stmt.query_map(params_from_iter(params.iter().map(to_sql)), |row| {
        let mut out = Row::new();
        for (i, name) in columns.iter().enumerate() {
            out.insert(name.clone(), from_sql(row.get_ref(i)?));
        }
        Ok(out)
    })?;
    rows.collect()
}

pub fn to_sql(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

pub fn from_sql(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_db(prefix: &str) -> DatabaseConfig {
        let dir = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        DatabaseConfig {
            database: dir.join("university.sqlite3").to_string_lossy().to_string(),
            ..DatabaseConfig::default()
        }
    }

    pub(crate) fn bootstrapped(prefix: &str) -> Executor {
        let exec = Executor::new(temp_db(prefix));
        let conn = exec.connect().expect("connect");
        db::ensure_schema(&conn).expect("schema");
        exec
    }

    #[test]
    fn write_commits_and_read_returns_ordered_rows() {
        let exec = bootstrapped("unidash-exec-write");
        let out = exec.write(
            "INSERT INTO Department(dept_name, building, budget) VALUES(?, ?, ?)",
            &[json!("CS"), json!("Gates"), json!(125000.5)],
        );
        assert!(out.success, "{}", out.message);
        assert_eq!(out.rows_affected, 1);

        let mut notices = Notices::new();
        let rows = exec.read(
            "SELECT dept_id, dept_name, budget FROM Department",
            &[],
            &mut notices,
        );
        assert!(notices.is_empty());
        assert_eq!(rows.len(), 1);
        let cols: Vec<&str> = rows[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(cols, vec!["dept_id", "dept_name", "budget"]);
        assert_eq!(rows[0]["dept_name"], json!("CS"));
        assert_eq!(rows[0]["budget"], json!(125000.5));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let exec = bootstrapped("unidash-exec-batch");
        let out = exec.write_batch(
            "INSERT INTO Grade(grade_id, letter_grade) VALUES(?, ?)",
            &[
                vec![json!(1), json!("A")],
                vec![json!(2), json!("B")],
                vec![json!(1), json!("C")],
            ],
        );
        assert!(!out.success);
        assert!(out.message.starts_with("Database error:"), "{}", out.message);

        let rows = exec
            .try_read("SELECT COUNT(*) AS n FROM Grade", &[])
            .expect("count");
        assert_eq!(rows[0]["n"], json!(0));
    }

    #[test]
    fn failed_read_degrades_to_empty_with_notice() {
        let exec = bootstrapped("unidash-exec-read");
        let mut notices = Notices::new();
        let rows = exec.read("SELECT nope FROM Missing_Table", &[], &mut notices);
        assert!(rows.is_empty());
        let msgs: Vec<String> = notices.iter().map(|n| n.message.clone()).collect();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("Database query error:"), "{}", msgs[0]);
    }

    #[test]
    fn unreachable_database_reports_connection_failure() {
        let missing = PathBuf::from("/nonexistent-unidash-dir/sub/university.sqlite3");
        let exec = Executor::new(DatabaseConfig {
            database: missing.to_string_lossy().to_string(),
            ..DatabaseConfig::default()
        });

        let mut notices = Notices::new();
        assert!(exec.read("SELECT 1", &[], &mut notices).is_empty());
        assert!(notices
            .iter()
            .any(|n| n.message.starts_with("Database connection failed")));

        let out = exec.write("DELETE FROM Grade", &[]);
        assert!(!out.success);
        assert_eq!(out.message, "Connection failed");
    }
}
