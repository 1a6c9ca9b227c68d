use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// `YYYY-MM-DD`, the value an HTML date input produces.
    Date,
    Number,
    Integer,
    Choice(&'static [&'static str]),
    /// Nested entries carried as a JSON array, such as invoice line items.
    List,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Integer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Choice(_) => "choice",
            FieldKind::List => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub editable: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            editable: true,
        }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub const fn number(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub const fn integer(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Integer)
    }

    pub const fn list(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::List)
    }

    pub const fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self::new(name, label, FieldKind::Choice(options))
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Derived from other fields; shown, sorted and exported but never bound from input.
    pub const fn computed(mut self) -> Self {
        self.editable = false;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub entity: &'static str,
    pub storage_key: &'static str,
    pub id_prefix: &'static str,
    pub fields: &'static [FieldSpec],
    pub search_fields: &'static [&'static str],
    pub filter_field: Option<&'static str>,
    pub list_columns: &'static [&'static str],
    pub paginated: bool,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Resolves a user-supplied column name by field name or label, ignoring case.
    pub fn resolve(&self, raw: &str) -> Option<&'static FieldSpec> {
        let needle = raw.trim();
        self.fields.iter().find(|field| {
            field.name.eq_ignore_ascii_case(needle) || field.label.eq_ignore_ascii_case(needle)
        })
    }

    pub fn editable_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|field| field.editable)
    }

    pub fn numeric_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|field| field.kind.is_numeric())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Integer(i64),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Number(value) => Some(*value),
            FieldValue::Integer(value) => Some(*value as f64),
        }
    }

    pub fn text(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(value) => write!(f, "{}", value),
            FieldValue::Number(value) => write!(f, "{}", value),
            FieldValue::Integer(value) => write!(f, "{}", value),
        }
    }
}

/// A flat, id-keyed entity persisted as one element of a JSON array.
///
/// Field access goes through [`Schema`] names so that query, form and CSV code
/// can stay generic while each record keeps typed fields.
pub trait Record: Clone + Default + fmt::Debug + Serialize + DeserializeOwned {
    fn schema() -> &'static Schema;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Returns `None` for names the schema does not declare.
    fn get(&self, field: &str) -> Option<FieldValue>;

    /// Returns `false` when the field is unknown, computed, or the value has the wrong shape.
    fn set(&mut self, field: &str, value: FieldValue) -> bool;

    fn seed() -> Vec<Self>;

    fn label(&self) -> String {
        let column = Self::schema().list_columns.first().copied().unwrap_or("id");
        self.get(column)
            .map(|value| value.to_string())
            .unwrap_or_else(|| self.id().to_string())
    }
}

pub(crate) fn take_text(slot: &mut String, value: FieldValue) -> bool {
    match value {
        FieldValue::Text(text) => {
            *slot = text;
            true
        }
        _ => false,
    }
}

pub(crate) fn take_number(slot: &mut f64, value: FieldValue) -> bool {
    match value.as_f64() {
        Some(number) => {
            *slot = number;
            true
        }
        None => false,
    }
}

pub(crate) fn take_integer(slot: &mut i64, value: FieldValue) -> bool {
    match value {
        FieldValue::Integer(number) => {
            *slot = number;
            true
        }
        FieldValue::Number(number) if number.fract() == 0.0 => {
            *slot = number as i64;
            true
        }
        _ => false,
    }
}
