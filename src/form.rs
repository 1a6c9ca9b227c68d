use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use time::macros::format_description;
use time::Date;

use crate::domain::{FieldKind, FieldSpec, FieldValue, Record};

/// Raw input strings keyed by field name, the way an HTML form hands them over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, String>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Later values win.
    pub fn merge(&mut self, other: &FormValues) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }

    /// Parses `field=value` assignments; everything after the first `=` is the value.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, FormError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut form = Self::new();
        for raw in assignments {
            let raw = raw.as_ref();
            let (field, value) = raw
                .split_once('=')
                .ok_or_else(|| FormError::MalformedAssignment(raw.to_string()))?;
            form.insert(field.trim(), value);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    UnknownField { entity: &'static str, field: String },
    ReadOnlyField(String),
    Required(&'static str),
    InvalidDate { field: &'static str, value: String },
    InvalidChoice {
        field: &'static str,
        value: String,
        options: &'static [&'static str],
    },
    MalformedAssignment(String),
    /// The record refused the coerced value, e.g. a `list` field that is not a JSON array of entries.
    InvalidValue { field: &'static str, value: String },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::UnknownField { entity, field } => {
                write!(f, "{} has no field '{}'", entity, field)
            }
            FormError::ReadOnlyField(field) => write!(f, "field '{}' is computed", field),
            FormError::Required(field) => write!(f, "field '{}' is required", field),
            FormError::InvalidDate { field, value } => write!(
                f,
                "field '{}' expects a YYYY-MM-DD date, got '{}'",
                field, value
            ),
            FormError::InvalidChoice {
                field,
                value,
                options,
            } => write!(
                f,
                "field '{}' must be one of {}, got '{}'",
                field,
                options.join("|"),
                value
            ),
            FormError::MalformedAssignment(raw) => {
                write!(f, "expected field=value, got '{}'", raw)
            }
            FormError::InvalidValue { field, value } => {
                write!(f, "field '{}' cannot hold '{}'", field, value)
            }
        }
    }
}

impl Error for FormError {}

/// Initial state of the "add" form.
pub fn blank_form<R: Record>() -> FormValues {
    edit_form(&R::default())
}

/// Every editable field of `record`, pre-populated.
pub fn edit_form<R: Record>(record: &R) -> FormValues {
    let mut form = FormValues::new();
    for spec in R::schema().editable_fields() {
        let value = record
            .get(spec.name)
            .map(|value| value.to_string())
            .unwrap_or_default();
        form.insert(spec.name, value);
    }
    form
}

/// Binds a complete form onto `base`.
///
/// Numbers follow `parseFloat`/`parseInt` and fall back to 0; required, date
/// and select constraints mirror the browser's native validation. Keys that
/// are absent from `values` leave the base field untouched.
pub fn submit<R: Record>(mut base: R, values: &FormValues) -> Result<R, FormError> {
    let schema = R::schema();
    for (key, _) in values.iter() {
        match schema.field(key) {
            Some(spec) if !spec.editable => return Err(FormError::ReadOnlyField(key.to_string())),
            Some(_) => {}
            None => {
                return Err(FormError::UnknownField {
                    entity: schema.entity,
                    field: key.to_string(),
                })
            }
        }
    }

    for spec in schema.editable_fields() {
        let Some(raw) = values.get(spec.name) else {
            continue;
        };
        let value = coerce(spec, raw)?;
        if !base.set(spec.name, value) {
            return Err(FormError::InvalidValue {
                field: spec.name,
                value: raw.to_string(),
            });
        }
    }

    for spec in schema.editable_fields().filter(|spec| spec.required) {
        let empty = base
            .get(spec.name)
            .map(|value| value.to_string().trim().is_empty())
            .unwrap_or(true);
        if empty {
            return Err(FormError::Required(spec.name));
        }
    }

    Ok(base)
}

/// Applies `changes` on top of the record's current values, like editing a pre-filled form.
pub fn submit_edit<R: Record>(record: R, changes: &FormValues) -> Result<R, FormError> {
    let mut form = edit_form(&record);
    form.merge(changes);
    submit(record, &form)
}

pub fn coerce(spec: &FieldSpec, raw: &str) -> Result<FieldValue, FormError> {
    let value = match spec.kind {
        FieldKind::Text => FieldValue::Text(raw.to_string()),
        FieldKind::List => FieldValue::Text(raw.trim().to_string()),
        FieldKind::Number => FieldValue::Number(parse_float_prefix(raw).unwrap_or(0.0)),
        FieldKind::Integer => FieldValue::Integer(parse_int_prefix(raw).unwrap_or(0)),
        FieldKind::Date => {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && !is_iso_date(trimmed) {
                return Err(FormError::InvalidDate {
                    field: spec.name,
                    value: raw.to_string(),
                });
            }
            FieldValue::Text(trimmed.to_string())
        }
        FieldKind::Choice(options) => {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && !options.contains(&trimmed) {
                return Err(FormError::InvalidChoice {
                    field: spec.name,
                    value: raw.to_string(),
                    options,
                });
            }
            FieldValue::Text(trimmed.to_string())
        }
    };
    Ok(value)
}

fn is_iso_date(raw: &str) -> bool {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).is_ok()
}

/// Longest numeric prefix, like `parseFloat`. Non-finite results count as failures.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    text[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Leading optionally-signed digits, like `parseInt(raw, 10)`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    text[..end].parse::<i64>().ok()
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
