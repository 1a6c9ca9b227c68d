use std::io::Read;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::ai::{AiObserver, AiRequest, Attachment, SilentObserver};
use crate::app::{App, AppError};
use crate::cli::QueryArgs;
use crate::domain::{FieldKind, FieldValue, Invoice, Record, Schema};
use crate::form::{self, FormValues};
use crate::print_json;
use crate::query::{FieldFilter, QueryState, RecordQuery, SortSpec};
use crate::transfer::{self, FileFormat, ImportOptions, ImportSummary};
use crate::ui::{self, Cell, Palette};

/// Runs `$body` with `$record` bound to the record type of an [`EntityKind`](crate::domain::EntityKind).
macro_rules! with_record {
    ($kind:expr, $record:ident => $body:expr) => {{
        use crate::domain::EntityKind;
        match $kind {
            EntityKind::Projects => {
                type $record = crate::domain::Project;
                $body
            }
            EntityKind::Tasks => {
                type $record = crate::domain::Task;
                $body
            }
            EntityKind::Invoices => {
                type $record = crate::domain::Invoice;
                $body
            }
            EntityKind::Shipments => {
                type $record = crate::domain::Shipment;
                $body
            }
            EntityKind::Companies => {
                type $record = crate::domain::PortfolioCompany;
                $body
            }
            EntityKind::Products => {
                type $record = crate::domain::Product;
                $body
            }
        }
    }};
}
pub(crate) use with_record;

/// Replays the flags the way the dashboards apply clicks: search, filter,
/// header clicks, then the page number last so the earlier resets don't undo it.
pub fn build_query(
    schema: &Schema,
    args: &QueryArgs,
    default_page_size: usize,
) -> Result<RecordQuery, AppError> {
    let paginate = !args.no_page && (schema.paginated || args.page.is_some() || args.page_size.is_some());
    let mut state = QueryState::new(paginate.then(|| args.page_size.unwrap_or(default_page_size)));

    state.set_search(args.search.clone());

    if let Some(value) = args.filter.as_deref() {
        let filter = match args.filter_field.as_deref() {
            Some(field) => FieldFilter {
                field: canonical_field(schema, field),
                value: value.to_string(),
            },
            None => FieldFilter::on_default(schema, value)?,
        };
        state.set_filter(Some(filter));
    }

    for field in &args.sort {
        state.toggle_sort(&canonical_field(schema, field));
    }
    if args.desc {
        let sort = state.query().sort.clone().ok_or_else(|| {
            AppError::InvalidArgument("--desc needs a --sort field".to_string())
        })?;
        state.set_sort(Some(SortSpec {
            direction: sort.direction.flipped(),
            ..sort
        }));
    }

    if let Some(page) = args.page {
        state.set_page(page);
    }
    Ok(state.query().clone())
}

/// Accepts labels such as "Due Date" for `dueDate`; unknown names pass through for validation.
fn canonical_field(schema: &Schema, raw: &str) -> String {
    schema
        .resolve(raw)
        .map(|spec| spec.name.to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Cell text for a list column; `relabel` may replace a raw value (e.g. a project id by its name).
fn cell_text<R: Record>(record: &R, column: &str, relabel: &dyn Fn(&R, &str) -> Option<String>) -> String {
    if let Some(label) = relabel(record, column) {
        return label;
    }
    match record.get(column) {
        Some(FieldValue::Number(value)) => format_number(value),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Leaves every column as stored.
pub fn no_relabel<R>(_record: &R, _column: &str) -> Option<String> {
    None
}

pub fn list<R: Record>(
    app: &App,
    args: &QueryArgs,
    json: bool,
    palette: &Palette,
    relabel: &dyn Fn(&R, &str) -> Option<String>,
) -> Result<(), AppError> {
    let schema = R::schema();
    let query = build_query(schema, args, app.config().query.page_size)?;
    let page = app.list::<R>(&query)?;
    if json {
        print_json(&page);
        return Ok(());
    }

    let total = if query.is_identity() {
        page.matched
    } else {
        app.list::<R>(&RecordQuery::default())?.matched
    };
    if let Some(summary) = ui::query_summary(&query) {
        println!("{}", palette.dim(&summary));
    }
    let mut headers = vec!["id"];
    headers.extend(schema.list_columns.iter().copied());
    let rows: Vec<Vec<Cell>> = page
        .items
        .iter()
        .map(|record| {
            let mut row = vec![Cell::plain(record.id())];
            row.extend(schema.list_columns.iter().map(|column| {
                let text = cell_text(record, column, relabel);
                if Some(*column) == schema.filter_field {
                    Cell::status(text)
                } else {
                    Cell::plain(text)
                }
            }));
            row
        })
        .collect();
    print!("{}", ui::format_table(&headers, &rows, palette));
    println!(
        "{}",
        palette.dim(&ui::format_footer(page.items.len(), page.matched, total, page.page))
    );
    Ok(())
}

fn print_record<R: Record>(record: &R, json: bool, palette: &Palette) {
    if json {
        print_json(record);
        return;
    }
    let mut rows = vec![("ID".to_string(), record.id().to_string())];
    rows.extend(R::schema().fields.iter().map(|spec| {
        let value = record
            .get(spec.name)
            .map(|value| value.to_string())
            .unwrap_or_default();
        (spec.label.to_string(), value)
    }));
    print!("{}", ui::format_detail(&rows, palette));
}

pub fn show<R: Record>(app: &App, id: &str, json: bool, palette: &Palette) -> Result<(), AppError> {
    let record = app.show::<R>(id)?;
    print_record(&record, json, palette);
    Ok(())
}

pub fn add<R: Record>(app: &App, values: &[String], json: bool, palette: &Palette) -> Result<(), AppError> {
    let values = FormValues::from_assignments(values)?;
    let record = app.create::<R>(&values)?;
    if json {
        print_json(&record);
    } else {
        println!("added {} {}", R::schema().entity, palette.id(record.id()));
    }
    Ok(())
}

pub fn update<R: Record>(
    app: &App,
    id: &str,
    values: &[String],
    json: bool,
    palette: &Palette,
) -> Result<(), AppError> {
    let changes = FormValues::from_assignments(values)?;
    let record = app.update::<R>(id, &changes)?;
    if json {
        print_json(&record);
    } else {
        println!("updated {} {}", R::schema().entity, palette.id(record.id()));
    }
    Ok(())
}

pub fn remove<R: Record>(app: &App, id: &str, yes: bool) -> Result<(), AppError> {
    let entity = R::schema().entity;
    if !ui::confirm(&format!("delete {} '{}'", entity, id), yes)? {
        println!("aborted");
        return Ok(());
    }
    let removed = app.remove::<R>(id)?;
    println!("removed {} {} ({})", entity, removed.id(), removed.label());
    Ok(())
}

pub fn clear<R: Record>(app: &App, yes: bool, reseed: bool) -> Result<(), AppError> {
    let key = R::schema().storage_key;
    let question = if reseed {
        format!("replace every record in '{}' with seed data", key)
    } else {
        format!("delete every record in '{}'", key)
    };
    if !ui::confirm(&question, yes)? {
        println!("aborted");
        return Ok(());
    }
    if reseed {
        let count = app.reseed::<R>()?;
        println!("reseeded {} with {} record(s)", key, count);
    } else {
        let count = app.clear::<R>()?;
        println!("cleared {} record(s) from {}", count, key);
    }
    Ok(())
}

pub fn fields<R: Record>(json: bool, palette: &Palette) {
    let schema = R::schema();
    let blank = form::blank_form::<R>();
    if json {
        let fields: Vec<serde_json::Value> = schema
            .fields
            .iter()
            .map(|spec| {
                let options = match spec.kind {
                    FieldKind::Choice(options) => options.to_vec(),
                    _ => Vec::new(),
                };
                serde_json::json!({
                    "name": spec.name,
                    "label": spec.label,
                    "kind": spec.kind.as_str(),
                    "required": spec.required,
                    "editable": spec.editable,
                    "options": options,
                    "default": blank.get(spec.name),
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "entity": schema.entity,
            "storage_key": schema.storage_key,
            "search_fields": schema.search_fields,
            "filter_field": schema.filter_field,
            "fields": fields,
        }));
        return;
    }

    let rows: Vec<Vec<Cell>> = schema
        .fields
        .iter()
        .map(|spec| {
            let mut notes = Vec::new();
            if spec.required {
                notes.push("required".to_string());
            }
            if !spec.editable {
                notes.push("computed".to_string());
            }
            if let FieldKind::Choice(options) = spec.kind {
                notes.push(options.join("|"));
            }
            vec![
                Cell::plain(spec.name),
                Cell::plain(spec.label),
                Cell::plain(spec.kind.as_str()),
                Cell::plain(notes.join(", ")),
            ]
        })
        .collect();
    print!(
        "{}",
        ui::format_table(&["field", "label", "kind", "notes"], &rows, palette)
    );
}

pub fn line_items(app: &App, invoice_id: &str, json: bool, palette: &Palette) -> Result<(), AppError> {
    let invoice = app.show::<Invoice>(invoice_id)?;
    if json {
        print_json(&invoice.items);
        return Ok(());
    }
    let rows: Vec<Vec<Cell>> = invoice
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            vec![
                Cell::plain((index + 1).to_string()),
                Cell::plain(item.description.clone()),
                Cell::plain(format_number(item.quantity)),
                Cell::plain(format_number(item.unit_price)),
                Cell::plain(format_number(item.amount())),
            ]
        })
        .collect();
    print!(
        "{}",
        ui::format_table(&["#", "description", "quantity", "unit price", "amount"], &rows, palette)
    );
    println!(
        "{}",
        palette.dim(&format!(
            "subtotal {}  tax {}%  total {}",
            format_number(invoice.subtotal()),
            format_number(invoice.tax_rate),
            format_number(invoice.total())
        ))
    );
    Ok(())
}

pub fn write_output(output: Option<&Path>, content: &str) -> Result<(), AppError> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn export<R: Record>(
    app: &App,
    format: FileFormat,
    args: &QueryArgs,
    output: Option<&Path>,
) -> Result<(), AppError> {
    let mut query = build_query(R::schema(), args, app.config().query.page_size)?;
    if args.page.is_none() && args.page_size.is_none() {
        query.page = None;
    }
    let content = app.export::<R>(format, &query)?;
    write_output(output, &content)
}

pub fn template<R: Record>(output: Option<&Path>) -> Result<(), AppError> {
    write_output(output, &transfer::template_csv::<R>())
}

pub fn import<R: Record>(
    app: &App,
    file: &Path,
    format: Option<FileFormat>,
    options: ImportOptions,
    json: bool,
) -> Result<(), AppError> {
    let summary = app.import::<R>(file, format, options)?;
    if json {
        print_json(&summary);
    } else {
        print_import_summary(&summary);
    }
    if summary.status == "failed" {
        return Err(AppError::InvalidArgument(format!(
            "import failed: {} row error(s)",
            summary.error_count
        )));
    }
    Ok(())
}

fn print_import_summary(summary: &ImportSummary) {
    println!(
        "import {}: {} processed, {} imported, {} error(s)",
        summary.status, summary.processed_count, summary.imported_count, summary.error_count
    );
    if !summary.ignored_columns.is_empty() {
        println!("ignored columns: {}", summary.ignored_columns.join(", "));
    }
    for error in &summary.errors {
        println!("  {}", error);
    }
}

pub fn stats<R: Record>(app: &App, args: &QueryArgs, json: bool, palette: &Palette) -> Result<(), AppError> {
    let mut query = build_query(R::schema(), args, app.config().query.page_size)?;
    query.page = None;
    let summary = app.summarize::<R>(&query)?;
    if json {
        print_json(&summary);
        return Ok(());
    }

    println!("{}", palette.heading(&format!("{} ({})", R::schema().storage_key, summary.count)));
    for (category, count) in &summary.by_category {
        let label = if category.is_empty() { "(none)" } else { category.as_str() };
        println!("  {}  {}", palette.status(label), count);
    }
    let rows: Vec<Vec<Cell>> = summary
        .numeric
        .iter()
        .map(|numeric| {
            vec![
                Cell::plain(numeric.field.clone()),
                Cell::plain(format_number(numeric.sum)),
                Cell::plain(format_number(numeric.min)),
                Cell::plain(format_number(numeric.max)),
                Cell::plain(format_number(numeric.average)),
            ]
        })
        .collect();
    if !rows.is_empty() {
        print!(
            "{}",
            ui::format_table(&["field", "sum", "min", "max", "average"], &rows, palette)
        );
    }
    Ok(())
}

pub fn ai_attachment<R: Record>(app: &App, args: &QueryArgs) -> Result<Attachment, AppError> {
    let mut query = build_query(R::schema(), args, app.config().query.page_size)?;
    query.page = None;
    app.ai_context::<R>(&query)
}

pub fn read_prompt(prompt: Option<String>) -> Result<String, AppError> {
    let prompt = match prompt {
        Some(prompt) => prompt,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if prompt.trim().is_empty() {
        return Err(AppError::InvalidArgument("prompt is empty".to_string()));
    }
    Ok(prompt)
}

pub fn file_attachment(path: &Path) -> Result<Attachment, AppError> {
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment { name, content })
}

/// Runs one assistant request on a current-thread runtime; Ctrl-C cancels it.
pub fn ask(app: &App, request: AiRequest, json: bool) -> Result<(), AppError> {
    let gateway = app.ai_gateway();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let cancel = CancellationToken::new();
    let terminal = ui::TerminalObserver::for_stderr();
    let observer: &dyn AiObserver = if json { &SilentObserver } else { &terminal };

    let reply = runtime.block_on(async {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });
        gateway.submit(&request, &cancel, observer).await
    })?;

    if json {
        print_json(&serde_json::json!({
            "text": reply.text,
            "json": reply.json(),
        }));
    } else {
        println!("{}", reply.text.trim_end());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{build_query, canonical_field, format_number};
    use crate::cli::QueryArgs;
    use crate::domain::{Invoice, Record, Shipment};
    use crate::query::SortDirection;

    #[test]
    fn invoices_paginate_by_default_and_others_do_not() {
        let query = build_query(Invoice::schema(), &QueryArgs::default(), 10).expect("query");
        assert_eq!(query.page.map(|page| page.size), Some(10));

        let query = build_query(Shipment::schema(), &QueryArgs::default(), 10).expect("query");
        assert!(query.page.is_none());
    }

    #[test]
    fn repeated_sort_flips_and_page_survives() {
        let args = QueryArgs {
            search: Some("acme".to_string()),
            sort: vec!["Client".to_string(), "client".to_string()],
            page: Some(2),
            ..QueryArgs::default()
        };
        let query = build_query(Invoice::schema(), &args, 5).expect("query");
        let sort = query.sort.expect("sort");
        assert_eq!(sort.field, "client");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(query.page.map(|page| (page.number, page.size)), Some((2, 5)));
    }

    #[test]
    fn desc_requires_sort_and_filter_uses_category_field() {
        let args = QueryArgs {
            desc: true,
            ..QueryArgs::default()
        };
        assert!(build_query(Invoice::schema(), &args, 10).is_err());

        let args = QueryArgs {
            filter: Some("paid".to_string()),
            ..QueryArgs::default()
        };
        let query = build_query(Invoice::schema(), &args, 10).expect("query");
        assert_eq!(query.filter.map(|filter| filter.field), Some("status".to_string()));
    }

    #[test]
    fn labels_resolve_to_field_names() {
        assert_eq!(canonical_field(Invoice::schema(), "due date"), "dueDate");
        assert_eq!(canonical_field(Invoice::schema(), " id "), "id");
    }

    #[test]
    fn numbers_show_cents_only_when_fractional() {
        assert_eq!(format_number(4500.0), "4500");
        assert_eq!(format_number(110.555), "110.56");
    }
}
