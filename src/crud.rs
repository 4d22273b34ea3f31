//! Generic entity pages: List, Add, Update and Delete views composed from an
//! [`EntitySpec`].

use crate::dependent::{Bindings, Guard, PlanReport, WritePlan};
use crate::error::CrudError;
use crate::executor::{Executor, Row};
use crate::forms::{display_text, today, FieldDescriptor, Form, Widget};
use crate::notice::Notices;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Declarative description of one entity page.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    /// Navigation name, e.g. "Courses".
    pub page: &'static str,
    /// Singular display name, e.g. "Course".
    pub entity: &'static str,
    /// One column, or several joined by commas for a composite key.
    pub key_column: &'static str,
    /// Columns joined into the record label; empty means `name`, then `title`.
    pub label_columns: &'static [&'static str],
    pub display_query: &'static str,
    /// Selects the editable fields of one record; bound to the key tuple.
    pub get_record_query: &'static str,
    pub fields: Vec<FieldDescriptor>,
    pub insert: Option<WritePlan>,
    pub update: Option<WritePlan>,
    pub delete: Option<WritePlan>,
    pub delete_guards: Vec<Guard>,
}

impl EntitySpec {
    pub fn key_columns(&self) -> Vec<&'static str> {
        self.key_column
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn delete_plan(&self) -> Option<WritePlan> {
        self.delete.as_ref().map(|p| p.guarded(&self.delete_guards))
    }

    pub fn capabilities(&self) -> serde_json::Value {
        json!({
            "page": self.page,
            "entity": self.entity,
            "keyColumns": self.key_columns(),
            "add": self.insert.is_some(),
            "update": self.update.is_some(),
            "delete": self.delete.is_some(),
        })
    }
}

/// One selectable record for the Update/Delete views.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordChoice {
    pub label: String,
    pub key: Vec<Value>,
}

/// How the host identifies the record being edited or deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Key(Vec<Value>),
    Label(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateView {
    pub key: Vec<Value>,
    pub current: Row,
    pub fields: Vec<Widget>,
}

/// The record shown for confirmation before it is deleted.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteView {
    pub key: Vec<Value>,
    pub current: Row,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenView {
    pub list: ListView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_form: Option<Vec<Widget>>,
    pub choices: Vec<RecordChoice>,
}

/// `"<key values> - <label text>"`.
pub fn record_label(row: &Row, key_columns: &[&str], label_columns: &[&str]) -> String {
    let mut parts: Vec<String> = key_columns
        .iter()
        .map(|k| display_text(row.get(*k).unwrap_or(&Value::Null)))
        .collect();

    let text = if label_columns.is_empty() {
        row.get("name")
            .or_else(|| row.get("title"))
            .map(display_text)
            .unwrap_or_default()
    } else {
        label_columns
            .iter()
            .map(|c| display_text(row.get(*c).unwrap_or(&Value::Null)))
            .collect::<Vec<_>>()
            .join(" ")
    };
    parts.push(text);
    parts.join(" - ")
}

pub fn record_choices(spec: &EntitySpec, rows: &[Row]) -> Vec<RecordChoice> {
    let keys = spec.key_columns();
    rows.iter()
        .map(|row| RecordChoice {
            label: record_label(row, &keys, spec.label_columns),
            key: keys
                .iter()
                .map(|k| row.get(*k).cloned().unwrap_or(Value::Null))
                .collect(),
        })
        .collect()
}

/// Map a selection back to the key tuple. Labels resolve by exact position in
/// `choices`; a single-column key also accepts the leading integer of the label.
pub fn resolve_selection(
    spec: &EntitySpec,
    choices: &[RecordChoice],
    selection: &Selection,
) -> Result<Vec<Value>, CrudError> {
    let key_count = spec.key_columns().len();
    match selection {
        Selection::Key(key) if key.len() == key_count => Ok(key.clone()),
        Selection::Key(key) => Err(CrudError::Selection(format!(
            "{} key needs {} value(s), got {}",
            spec.entity,
            key_count,
            key.len()
        ))),
        Selection::Label(label) => {
            if let Some(choice) = choices.iter().find(|c| &c.label == label) {
                return Ok(choice.key.clone());
            }
            if key_count == 1 {
                let lead = label.split('-').next().unwrap_or_default().trim();
                if let Ok(id) = lead.parse::<i64>() {
                    return Ok(vec![Value::from(id)]);
                }
            }
            Err(CrudError::Selection(format!(
                "no {} matches '{}'",
                spec.entity.to_lowercase(),
                label
            )))
        }
    }
}

/// The four views of one entity, bound to an executor for one render pass.
pub struct EntityPage<'a> {
    spec: &'a EntitySpec,
    executor: &'a Executor,
}

impl<'a> EntityPage<'a> {
    pub fn new(spec: &'a EntitySpec, executor: &'a Executor) -> Self {
        Self { spec, executor }
    }

    pub fn spec(&self) -> &EntitySpec {
        self.spec
    }

    fn unsupported(&self, view: &'static str) -> CrudError {
        CrudError::Unsupported {
            entity: self.spec.entity.to_string(),
            view,
        }
    }

    pub fn fetch(&self, notices: &mut Notices) -> Vec<Row> {
        self.executor.read(self.spec.display_query, &[], notices)
    }

    pub fn list_view(&self, rows: Vec<Row>, notices: &mut Notices) -> ListView {
        if rows.is_empty() {
            notices.info(format!(
                "No {} records found",
                self.spec.entity.to_lowercase()
            ));
        }
        let columns = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        ListView { columns, rows }
    }

    pub fn list(&self, notices: &mut Notices) -> ListView {
        let rows = self.fetch(notices);
        self.list_view(rows, notices)
    }

    /// List, add form and record choices from a single fetch of the display query.
    pub fn open(&self, notices: &mut Notices) -> OpenView {
        let rows = self.fetch(notices);
        let choices = record_choices(self.spec, &rows);
        let add_form = self.add_form(notices).ok();
        OpenView {
            list: self.list_view(rows, notices),
            add_form,
            choices,
        }
    }

    pub fn choices(&self, notices: &mut Notices) -> Vec<RecordChoice> {
        record_choices(self.spec, &self.fetch(notices))
    }

    pub fn resolve(&self, selection: &Selection, notices: &mut Notices) -> Result<Vec<Value>, CrudError> {
        match selection {
            Selection::Key(_) => resolve_selection(self.spec, &[], selection),
            Selection::Label(_) => resolve_selection(self.spec, &self.choices(notices), selection),
        }
    }

    pub fn add_form(&self, notices: &mut Notices) -> Result<Vec<Widget>, CrudError> {
        if self.spec.insert.is_none() {
            return Err(self.unsupported("add"));
        }
        let form = Form::load(self.executor, &self.spec.fields, notices);
        Ok(form.add_widgets(today()))
    }

    pub fn add(&self, submitted: &Map<String, Value>, notices: &mut Notices) -> Result<PlanReport, CrudError> {
        let plan = self.spec.insert.as_ref().ok_or_else(|| self.unsupported("add"))?;
        let form = Form::load(self.executor, &self.spec.fields, notices);
        let widgets = form.add_widgets(today());
        let values = form.collect(&widgets, submitted)?;

        let report = plan.apply(self.executor, &[Bindings::fields(values)])?;
        tracing::info!(entity = self.spec.entity, rows = report.rows_affected, "record added");
        Ok(report)
    }

    pub fn current_record(&self, key: &[Value], notices: &mut Notices) -> Result<Row, CrudError> {
        self.executor
            .read(self.spec.get_record_query, key, notices)
            .into_iter()
            .next()
            .ok_or_else(|| CrudError::NotFound("Record not found".to_string()))
    }

    pub fn update_form(&self, key: &[Value], notices: &mut Notices) -> Result<UpdateView, CrudError> {
        if self.spec.update.is_none() {
            return Err(self.unsupported("update"));
        }
        let current = self.current_record(key, notices)?;
        let form = Form::load(self.executor, &self.spec.fields, notices);
        let fields = form.update_widgets(&current, today());
        Ok(UpdateView {
            key: key.to_vec(),
            current,
            fields,
        })
    }

    pub fn update(
        &self,
        key: &[Value],
        submitted: &Map<String, Value>,
        notices: &mut Notices,
    ) -> Result<PlanReport, CrudError> {
        let plan = self.spec.update.as_ref().ok_or_else(|| self.unsupported("update"))?;
        let current = self.current_record(key, notices)?;
        let form = Form::load(self.executor, &self.spec.fields, notices);
        let widgets = form.update_widgets(&current, today());
        let values = form.collect(&widgets, submitted)?;

        let bindings = Bindings {
            fields: values,
            keys: key.to_vec(),
        };
        let report = plan.apply(self.executor, &[bindings])?;
        tracing::info!(entity = self.spec.entity, rows = report.rows_affected, "record updated");
        Ok(report)
    }

    pub fn delete_preview(&self, key: &[Value], notices: &mut Notices) -> Result<DeleteView, CrudError> {
        if self.spec.delete.is_none() {
            return Err(self.unsupported("delete"));
        }
        let current = self.current_record(key, notices)?;
        Ok(DeleteView {
            key: key.to_vec(),
            current,
        })
    }

    pub fn delete(&self, key: &[Value]) -> Result<PlanReport, CrudError> {
        self.delete_many(&[key.to_vec()])
    }

    /// Delete every key tuple in one transaction; any failure leaves all rows in place.
    pub fn delete_many(&self, keys: &[Vec<Value>]) -> Result<PlanReport, CrudError> {
        let plan = self.spec.delete_plan().ok_or_else(|| self.unsupported("delete"))?;
        let key_count = self.spec.key_columns().len();
        if keys.is_empty() {
            return Err(CrudError::Selection("no records selected".to_string()));
        }
        if let Some(bad) = keys.iter().find(|k| k.len() != key_count) {
            return Err(CrudError::Selection(format!(
                "{} key needs {} value(s), got {}",
                self.spec.entity,
                key_count,
                bad.len()
            )));
        }

        let report = match plan.key_only_statement() {
            Some(sql) => PlanReport {
                rows_affected: self.executor.try_write_batch(sql, keys)?,
                ..PlanReport::default()
            },
            None => {
                let sets: Vec<Bindings> = keys.iter().cloned().map(Bindings::keys).collect();
                plan.apply(self.executor, &sets)?
            }
        };
        tracing::info!(entity = self.spec.entity, rows = report.rows_affected, "records deleted");
        Ok(report)
    }
}
