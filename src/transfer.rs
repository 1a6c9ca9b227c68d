use std::error::Error;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::csv::{self, CsvError};
use crate::domain::Record;
use crate::form::{self, FormValues};
use crate::storage::now_utc_rfc3339;
use crate::store::{RecordStore, StoreError};

#[derive(Debug)]
pub enum TransferError {
    Csv(CsvError),
    Json(serde_json::Error),
    Store(StoreError),
    NoKnownColumns { entity: &'static str },
    UnexpectedJson(String),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Csv(err) => write!(f, "CSV error: {}", err),
            TransferError::Json(err) => write!(f, "JSON error: {}", err),
            TransferError::Store(err) => write!(f, "{}", err),
            TransferError::NoKnownColumns { entity } => {
                write!(f, "CSV header matches no {} field", entity)
            }
            TransferError::UnexpectedJson(message) => write!(f, "unexpected JSON: {}", message),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransferError::Csv(err) => Some(err),
            TransferError::Json(err) => Some(err),
            TransferError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CsvError> for TransferError {
    fn from(value: CsvError) -> Self {
        TransferError::Csv(value)
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(value: serde_json::Error) -> Self {
        TransferError::Json(value)
    }
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        TransferError::Store(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }

    /// `.json` files are JSON; anything else is read as CSV.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Csv,
        }
    }
}

/// Header of field names, then one row per record. Computed fields are included.
pub fn export_csv<R: Record>(records: &[R]) -> String {
    let schema = R::schema();
    let mut out = String::new();
    csv::push_row(&mut out, schema.fields.iter().map(|spec| spec.name));
    for record in records {
        csv::push_row(
            &mut out,
            schema.fields.iter().map(|spec| {
                record
                    .get(spec.name)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            }),
        );
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope<'a, R> {
    export_date: &'a str,
    entity: &'static str,
    records: &'a [R],
}

pub fn export_json<R: Record>(records: &[R], export_date: &str) -> Result<String, TransferError> {
    let envelope = ExportEnvelope {
        export_date,
        entity: R::schema().entity,
        records,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Editable field names plus one example row taken from the sample data.
pub fn template_csv<R: Record>() -> String {
    let schema = R::schema();
    let example = R::seed().into_iter().next().unwrap_or_default();
    let mut out = String::new();
    csv::push_row(&mut out, schema.editable_fields().map(|spec| spec.name));
    csv::push_row(
        &mut out,
        schema.editable_fields().map(|spec| {
            example
                .get(spec.name)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }),
    );
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}

/// Records decoded from a file, before anything is written.
#[derive(Debug, Clone)]
pub struct DecodedBatch<R> {
    pub format: FileFormat,
    pub records: Vec<R>,
    pub errors: Vec<RowError>,
    pub ignored_columns: Vec<String>,
    pub processed: usize,
}

/// Binds each data row through the add form. `row` in errors is the line the row starts on.
pub fn decode_csv<R: Record>(input: &str) -> Result<DecodedBatch<R>, TransferError> {
    let schema = R::schema();
    let (header, rows) = csv::parse_with_header(input)?;

    let mut columns = Vec::with_capacity(header.len());
    let mut ignored_columns = Vec::new();
    for cell in &header {
        match schema.resolve(cell) {
            Some(spec) if spec.editable => columns.push(Some(spec.name)),
            Some(_) => columns.push(None),
            None => {
                if !cell.is_empty() {
                    ignored_columns.push(cell.clone());
                }
                columns.push(None);
            }
        }
    }
    if columns.iter().all(Option::is_none) {
        return Err(TransferError::NoKnownColumns {
            entity: schema.entity,
        });
    }

    let mut batch = DecodedBatch {
        format: FileFormat::Csv,
        records: Vec::new(),
        errors: Vec::new(),
        ignored_columns,
        processed: rows.len(),
    };
    for row in rows {
        let mut values = FormValues::new();
        for (column, cell) in columns.iter().zip(row.fields) {
            if let Some(field) = column {
                values.insert(*field, cell);
            }
        }
        match form::submit(R::default(), &values) {
            Ok(record) => batch.records.push(record),
            Err(err) => batch.errors.push(RowError {
                row: row.line,
                message: err.to_string(),
            }),
        }
    }
    Ok(batch)
}

/// Accepts a bare array or the object written by [`export_json`]. `row` is the 1-based position.
///
/// Each record is re-bound through its own edit form so JSON rows meet the same
/// required, date and select constraints as CSV rows.
pub fn decode_json<R: Record>(input: &str) -> Result<DecodedBatch<R>, TransferError> {
    let value: Value = serde_json::from_str(input)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("records") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TransferError::UnexpectedJson(
                    "object has no \"records\" array".to_string(),
                ))
            }
        },
        _ => {
            return Err(TransferError::UnexpectedJson(
                "expected an array of records".to_string(),
            ))
        }
    };

    let mut batch = DecodedBatch {
        format: FileFormat::Json,
        records: Vec::new(),
        errors: Vec::new(),
        ignored_columns: Vec::new(),
        processed: items.len(),
    };
    for (index, item) in items.into_iter().enumerate() {
        let bound = serde_json::from_value::<R>(item)
            .map_err(|err| err.to_string())
            .and_then(|record| {
                let values = form::edit_form(&record);
                form::submit(record, &values).map_err(|err| err.to_string())
            });
        match bound {
            Ok(record) => batch.records.push(record),
            Err(message) => batch.errors.push(RowError {
                row: index + 1,
                message,
            }),
        }
    }
    Ok(batch)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Any row error rejects the whole batch.
    pub strict: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub entity: String,
    pub source_type: String,
    pub source_ref: String,
    pub status: String,
    pub processed_count: u64,
    pub imported_count: u64,
    pub error_count: u64,
    pub ignored_columns: Vec<String>,
    pub errors: Vec<RowError>,
    pub imported_ids: Vec<String>,
    pub dry_run: bool,
    pub last_run_at: String,
}

/// Appends the good records with one save unless the batch is rejected or a dry run.
pub fn apply<R: Record>(
    store: &mut RecordStore<'_, R>,
    batch: DecodedBatch<R>,
    source_ref: &str,
    options: ImportOptions,
) -> Result<ImportSummary, TransferError> {
    let rejected = options.strict && !batch.errors.is_empty();
    let valid = batch.records.len() as u64;
    let mut imported_ids = Vec::new();
    if !options.dry_run && !rejected && !batch.records.is_empty() {
        imported_ids = store
            .append_all(batch.records)?
            .iter()
            .map(|record| record.id().to_string())
            .collect();
    }

    // A dry run reports how many rows would have been imported.
    let imported_count = if options.dry_run {
        valid
    } else {
        imported_ids.len() as u64
    };
    let status = if options.dry_run {
        "dry_run"
    } else if rejected || (imported_count == 0 && !batch.errors.is_empty()) {
        "failed"
    } else if batch.errors.is_empty() {
        "completed"
    } else {
        "partial"
    };

    tracing::info!(
        entity = R::schema().entity,
        source = source_ref,
        status,
        imported = imported_count,
        errors = batch.errors.len(),
        "import finished"
    );

    Ok(ImportSummary {
        entity: R::schema().entity.to_string(),
        source_type: batch.format.as_str().to_string(),
        source_ref: source_ref.to_string(),
        status: status.to_string(),
        processed_count: batch.processed as u64,
        imported_count,
        error_count: batch.errors.len() as u64,
        ignored_columns: batch.ignored_columns,
        errors: batch.errors,
        imported_ids,
        dry_run: options.dry_run,
        last_run_at: now_utc_rfc3339(),
    })
}

#[cfg(test)]
mod tests;
