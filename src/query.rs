use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use serde::Serialize;

use crate::domain::{FieldValue, Record, Schema};
use crate::form::parse_float_prefix;

/// Filter value that disables the categorical filter.
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub number: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordQuery {
    pub search: Option<String>,
    pub filter: Option<FieldFilter>,
    pub sort: Option<SortSpec>,
    pub page: Option<PageRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: usize,
    pub size: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage<R> {
    pub items: Vec<R>,
    pub matched: usize,
    pub page: Option<PageInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownField { entity: &'static str, field: String },
    NoFilterField(&'static str),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownField { entity, field } => {
                write!(f, "{} has no field '{}'", entity, field)
            }
            QueryError::NoFilterField(entity) => {
                write!(f, "{} has no default filter field; pass --filter-field", entity)
            }
        }
    }
}

impl Error for QueryError {}

impl FieldFilter {
    /// Targets the schema's categorical field.
    pub fn on_default(schema: &Schema, value: &str) -> Result<Self, QueryError> {
        let field = schema
            .filter_field
            .ok_or(QueryError::NoFilterField(schema.entity))?;
        Ok(Self {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    fn is_active(&self) -> bool {
        self.value != ALL
    }
}

impl RecordQuery {
    /// Rejects field names the record type does not declare.
    pub fn validate(&self, schema: &Schema) -> Result<(), QueryError> {
        let fields = self
            .filter
            .iter()
            .map(|filter| filter.field.as_str())
            .chain(self.sort.iter().map(|sort| sort.field.as_str()));
        for field in fields {
            if field != "id" && schema.field(field).is_none() {
                return Err(QueryError::UnknownField {
                    entity: schema.entity,
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        normalized_search(self.search.as_deref()).is_none()
            && !self.filter.as_ref().is_some_and(FieldFilter::is_active)
            && self.sort.is_none()
            && self.page.is_none()
    }
}

/// Search, filter, sort and paginate, in that order. The source slice is never touched.
pub fn run<R: Record>(records: &[R], query: &RecordQuery) -> QueryPage<R> {
    let mut matched = select(records, query);

    if let Some(sort) = query.sort.as_ref() {
        sort_records(&mut matched, sort);
    }

    let total = matched.len();
    match query.page {
        Some(request) => {
            let (items, info) = paginate(matched, request);
            QueryPage {
                items,
                matched: total,
                page: Some(info),
            }
        }
        None => QueryPage {
            items: matched,
            matched: total,
            page: None,
        },
    }
}

/// The search and filter stages only.
pub fn select<R: Record>(records: &[R], query: &RecordQuery) -> Vec<R> {
    let search = normalized_search(query.search.as_deref());
    let filter = query.filter.as_ref().filter(|filter| filter.is_active());
    records
        .iter()
        .filter(|record| search.as_deref().map_or(true, |term| matches_search(*record, term)))
        .filter(|record| filter.map_or(true, |filter| matches_filter(*record, filter)))
        .cloned()
        .collect()
}

fn normalized_search(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// `term` must already be lowercase.
pub fn matches_search<R: Record>(record: &R, term: &str) -> bool {
    R::schema().search_fields.iter().any(|field| {
        record
            .get(field)
            .map(|value| value.to_string().to_lowercase().contains(term))
            .unwrap_or(false)
    })
}

pub fn matches_filter<R: Record>(record: &R, filter: &FieldFilter) -> bool {
    record
        .get(&filter.field)
        .map(|value| value.to_string() == filter.value)
        .unwrap_or(false)
}

pub fn sort_records<R: Record>(records: &mut [R], sort: &SortSpec) {
    records.sort_by(|left, right| {
        let ordering = compare_values(
            left.get(&sort.field).as_ref(),
            right.get(&sort.field).as_ref(),
        );
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

pub fn compare_values(left: Option<&FieldValue>, right: Option<&FieldValue>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(FieldValue::Text(a)), Some(FieldValue::Text(b))) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
        (Some(a), Some(b)) => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Text(text) => parse_float_prefix(text),
        other => other.as_f64(),
    }
}

fn paginate<R>(records: Vec<R>, request: PageRequest) -> (Vec<R>, PageInfo) {
    let size = request.size.max(1);
    let page_count = records.len().div_ceil(size).max(1);
    let number = request.number.clamp(1, page_count);
    let items = records
        .into_iter()
        .skip((number - 1) * size)
        .take(size)
        .collect();
    (
        items,
        PageInfo {
            number,
            size,
            page_count,
        },
    )
}

/// Interactive view state: header clicks toggle sort, and any change other
/// than paging sends the view back to page one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    query: RecordQuery,
    page_size: Option<usize>,
}

impl QueryState {
    pub fn new(page_size: Option<usize>) -> Self {
        let mut state = Self {
            query: RecordQuery::default(),
            page_size,
        };
        state.reset_page();
        state
    }

    pub fn query(&self) -> &RecordQuery {
        &self.query
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.query.search = search;
        self.reset_page();
    }

    pub fn set_filter(&mut self, filter: Option<FieldFilter>) {
        self.query.filter = filter;
        self.reset_page();
    }

    /// Same field again flips the direction; a new field starts ascending.
    pub fn toggle_sort(&mut self, field: &str) {
        let direction = match self.query.sort.as_ref() {
            Some(current) if current.field == field => current.direction.flipped(),
            _ => SortDirection::Asc,
        };
        self.query.sort = Some(SortSpec {
            field: field.to_string(),
            direction,
        });
        self.reset_page();
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.query.sort = sort;
        self.reset_page();
    }

    pub fn set_page(&mut self, number: usize) {
        if let Some(page) = self.query.page.as_mut() {
            page.number = number.max(1);
        }
    }

    fn reset_page(&mut self) {
        self.query.page = self.page_size.map(|size| PageRequest { number: 1, size });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub field: String,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub entity: String,
    pub count: usize,
    pub by_category: BTreeMap<String, usize>,
    pub numeric: Vec<NumericSummary>,
}

/// Headline figures for a dashboard: counts per category and numeric totals.
pub fn summarize<R: Record>(records: &[R]) -> CollectionSummary {
    let schema = R::schema();
    let mut by_category = BTreeMap::new();
    if let Some(field) = schema.filter_field {
        for record in records {
            let key = record
                .get(field)
                .map(|value| value.to_string())
                .unwrap_or_default();
            *by_category.entry(key).or_insert(0) += 1;
        }
    }

    let numeric = schema
        .numeric_fields()
        .filter_map(|spec| {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|record| record.get(spec.name).and_then(|value| value.as_f64()))
                .collect();
            if values.is_empty() {
                return None;
            }
            let sum = values.iter().fold(0.0, |sum, value| sum + value);
            Some(NumericSummary {
                field: spec.name.to_string(),
                sum,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                average: sum / values.len() as f64,
            })
        })
        .collect();

    CollectionSummary {
        entity: schema.entity.to_string(),
        count: records.len(),
        by_category,
        numeric,
    }
}
