//! Descriptor-driven form widgets and their conversion into statement parameters.
//!
//! A form is a list of [`FieldDescriptor`]s. Rendering produces one [`Widget`] per
//! descriptor for the host UI; collecting turns the submitted widget values back
//! into positional parameters in descriptor order. `select` options are fetched
//! on every load, nothing is cached between requests.

use crate::error::FormError;
use crate::executor::{Executor, Row};
use crate::notice::Notices;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Display label to stored value, in option order.
pub type OptionMap = IndexMap<String, Value>;

/// Collected values keyed by field name, in descriptor order.
pub type FormValues = IndexMap<&'static str, Value>;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberSpec {
    pub min: f64,
    pub max: f64,
    pub default: Option<f64>,
    pub step: f64,
}

impl Default for NumberSpec {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1_000_000.0,
            default: None,
            step: 1.0,
        }
    }
}

impl NumberSpec {
    fn is_integral(&self) -> bool {
        self.min.fract() == 0.0 && self.step.fract() == 0.0
    }

    fn to_value(self, v: f64) -> Value {
        if self.is_integral() && v.fract() == 0.0 {
            return Value::from(v as i64);
        }
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectSource {
    Fixed(&'static [&'static str]),
    Lookup {
        query: &'static str,
        display_field: &'static str,
        value_field: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Date,
    Number(NumberSpec),
    Select(SelectSource),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDescriptor {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn number(name: &'static str, label: &'static str, spec: NumberSpec) -> Self {
        Self::new(name, label, FieldKind::Number(spec))
    }

    pub fn choice(name: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(name, label, FieldKind::Select(SelectSource::Fixed(options)))
    }

    pub fn lookup(
        name: &'static str,
        label: &'static str,
        query: &'static str,
        display_field: &'static str,
        value_field: &'static str,
    ) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select(SelectSource::Lookup {
                query,
                display_field,
                value_field,
            }),
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Number(_) => "number",
            FieldKind::Select(_) => "select",
        }
    }
}

/// What the host UI renders for one descriptor.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub name: String,
    pub label: String,
    pub kind: &'static str,
    pub required: bool,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl Widget {
    fn base(field: &FieldDescriptor, value: Value) -> Self {
        Self {
            name: field.name.to_string(),
            label: field.label.to_string(),
            kind: field.kind_name(),
            required: field.required,
            value,
            options: None,
            selected_index: None,
            min: None,
            max: None,
            step: None,
        }
    }

    fn number(field: &FieldDescriptor, spec: NumberSpec, value: f64) -> Self {
        Self {
            min: Some(spec.min),
            max: Some(spec.max),
            step: Some(spec.step),
            ..Self::base(field, spec.to_value(value))
        }
    }

    fn select(field: &FieldDescriptor, options: &OptionMap, index: usize) -> Self {
        let labels: Vec<String> = options.keys().cloned().collect();
        let value = labels
            .get(index)
            .map(|l| Value::String(l.clone()))
            .unwrap_or(Value::Null);
        Self {
            selected_index: (!labels.is_empty()).then_some(index),
            options: Some(labels),
            ..Self::base(field, value)
        }
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Text shown for a stored value.
pub fn display_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the option mapping from lookup rows. A repeated label keeps its first
/// position and takes the later value.
pub fn options_from_rows(rows: &[Row], display_field: &str, value_field: &str) -> OptionMap {
    let mut map = OptionMap::new();
    for row in rows {
        let label = row.get(display_field).map(display_text).unwrap_or_default();
        let value = row.get(value_field).cloned().unwrap_or(Value::Null);
        map.insert(label, value);
    }
    map
}

pub fn fixed_options(values: &[&str]) -> OptionMap {
    values
        .iter()
        .map(|v| (v.to_string(), Value::String(v.to_string())))
        .collect()
}

pub fn resolve_options(executor: &Executor, source: &SelectSource, notices: &mut Notices) -> OptionMap {
    match source {
        SelectSource::Fixed(values) => fixed_options(values),
        SelectSource::Lookup {
            query,
            display_field,
            value_field,
        } => {
            let rows = executor.read(query, &[], notices);
            options_from_rows(&rows, display_field, value_field)
        }
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Position of the option whose stored value equals `current`; the first option when none does.
pub fn current_option_index(options: &OptionMap, current: &Value) -> usize {
    options
        .values()
        .position(|v| same_value(v, current))
        .unwrap_or(0)
}

pub fn insert_params(values: &FormValues) -> Vec<Value> {
    values.values().cloned().collect()
}

/// Field values in descriptor order followed by the key values in key-column order.
pub fn update_params(values: &FormValues, keys: &[Value]) -> Vec<Value> {
    let mut params = insert_params(values);
    params.extend(keys.iter().cloned());
    params
}

fn as_number(field: &FieldDescriptor, raw: &Value) -> Result<Option<f64>, FormError> {
    let invalid = || FormError::InvalidNumber {
        label: field.label.to_string(),
        value: display_text(raw),
    };
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// A set of descriptors with their select options resolved for this render pass.
pub struct Form<'a> {
    fields: &'a [FieldDescriptor],
    options: Vec<OptionMap>,
}

impl<'a> Form<'a> {
    pub fn load(executor: &Executor, fields: &'a [FieldDescriptor], notices: &mut Notices) -> Self {
        let options = fields
            .iter()
            .map(|f| match &f.kind {
                FieldKind::Select(source) => resolve_options(executor, source, notices),
                _ => OptionMap::new(),
            })
            .collect();
        Self { fields, options }
    }

    /// Build a form from options that were already resolved, one map per field.
    pub fn with_options(fields: &'a [FieldDescriptor], options: Vec<OptionMap>) -> Self {
        Self { fields, options }
    }

    pub fn add_widgets(&self, today: NaiveDate) -> Vec<Widget> {
        self.fields
            .iter()
            .zip(&self.options)
            .map(|(field, options)| match &field.kind {
                FieldKind::Text => Widget::base(field, Value::String(String::new())),
                FieldKind::Date => {
                    Widget::base(field, Value::String(today.format(DATE_FORMAT).to_string()))
                }
                FieldKind::Number(spec) => {
                    Widget::number(field, *spec, spec.default.unwrap_or(spec.min))
                }
                FieldKind::Select(_) => Widget::select(field, options, 0),
            })
            .collect()
    }

    /// Widgets pre-populated from `current`, the record being edited.
    pub fn update_widgets(&self, current: &Row, today: NaiveDate) -> Vec<Widget> {
        self.fields
            .iter()
            .zip(&self.options)
            .map(|(field, options)| {
                let value = current.get(field.name).unwrap_or(&Value::Null);
                match &field.kind {
                    FieldKind::Text => Widget::base(field, Value::String(display_text(value))),
                    FieldKind::Date => {
                        let text = display_text(value);
                        let text = if text.is_empty() {
                            today.format(DATE_FORMAT).to_string()
                        } else {
                            text
                        };
                        Widget::base(field, Value::String(text))
                    }
                    FieldKind::Number(spec) => {
                        let n = as_number(field, value).ok().flatten().unwrap_or(spec.min);
                        Widget::number(field, *spec, n)
                    }
                    FieldKind::Select(_) => {
                        Widget::select(field, options, current_option_index(options, value))
                    }
                }
            })
            .collect()
    }

    /// Convert submitted values into typed values in descriptor order.
    /// Fields absent from `submitted` keep the value their widget was rendered with.
    pub fn collect(&self, widgets: &[Widget], submitted: &Map<String, Value>) -> Result<FormValues, FormError> {
        let mut out = FormValues::new();
        let mut missing: Vec<&str> = Vec::new();

        for ((field, options), widget) in self.fields.iter().zip(&self.options).zip(widgets) {
            let raw = submitted.get(field.name).unwrap_or(&widget.value);
            let value = match &field.kind {
                FieldKind::Text => match raw {
                    Value::Null => Value::Null,
                    other => Value::String(display_text(other)),
                },
                FieldKind::Date => {
                    let text = display_text(raw);
                    let text = text.trim();
                    if text.is_empty() {
                        Value::Null
                    } else {
                        let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| {
                            FormError::InvalidDate {
                                label: field.label.to_string(),
                                value: text.to_string(),
                            }
                        })?;
                        Value::String(date.format(DATE_FORMAT).to_string())
                    }
                }
                FieldKind::Number(spec) => match as_number(field, raw)? {
                    None => Value::Null,
                    Some(n) if n < spec.min || n > spec.max => {
                        return Err(FormError::OutOfRange {
                            label: field.label.to_string(),
                            value: n,
                            min: spec.min,
                            max: spec.max,
                        })
                    }
                    Some(n) => spec.to_value(n),
                },
                FieldKind::Select(_) => match raw {
                    Value::Null => Value::Null,
                    choice => {
                        let label = display_text(choice);
                        match options.get(&label) {
                            Some(v) => v.clone(),
                            None if options.is_empty() => Value::Null,
                            None => {
                                return Err(FormError::UnknownOption {
                                    label: field.label.to_string(),
                                    choice: label,
                                })
                            }
                        }
                    }
                },
            };

            let blank = match &value {
                Value::Null => true,
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            };
            if field.required && blank {
                missing.push(field.label);
            }
            out.insert(field.name, value);
        }

        if !missing.is_empty() {
            return Err(FormError::Missing(missing.join(", ")));
        }
        Ok(out)
    }
}
