use crate::domain::{Invoice, Product, Record, Shipment};
use crate::storage::{KeyValueStorage, MemoryStorage};
use crate::store::{CorruptPolicy, RecordStore};

use super::{
    apply, decode_csv, decode_json, export_csv, export_json, template_csv, ImportOptions,
    TransferError,
};

fn empty_store<R: Record>(storage: &MemoryStorage) -> RecordStore<'_, R> {
    storage
        .set_item(R::schema().storage_key, "[]")
        .expect("seed write");
    RecordStore::load(storage, CorruptPolicy::Fail).expect("store should load")
}

fn editable_values<R: Record>(record: &R) -> Vec<String> {
    R::schema()
        .editable_fields()
        .map(|spec| {
            record
                .get(spec.name)
                .map(|value| value.to_string())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn csv_export_then_import_reproduces_editable_fields() {
    let mut records = Invoice::seed();
    records[0].client = "Acme, Inc.".to_string();
    records[1].notes = "Customer said \"net 30\"\nthen paid early".to_string();
    records[2].tax_rate = 7.25;

    let exported = export_csv(&records);
    let batch = decode_csv::<Invoice>(&exported).expect("csv should decode");

    assert!(batch.errors.is_empty(), "{:?}", batch.errors);
    assert!(batch.ignored_columns.is_empty());
    assert_eq!(batch.records.len(), records.len());
    for (original, imported) in records.iter().zip(&batch.records) {
        assert_eq!(editable_values(original), editable_values(imported));
        assert_eq!(imported.items, original.items);
        assert_eq!(imported.total(), original.total());
    }
}

#[test]
fn blank_invoice_exports_zero_total_and_empty_items() {
    let blank = Invoice {
        number: "X".to_string(),
        client: "C".to_string(),
        status: "draft".to_string(),
        ..Invoice::default()
    };
    let exported = export_csv(&[blank]);
    let row = exported.lines().nth(1).expect("data row");
    assert_eq!(row, "X,C,draft,,,0,,[],0");
}

#[test]
fn csv_export_header_lists_fields_including_computed() {
    let exported = export_csv(&Invoice::seed());
    let header = exported.lines().next().expect("header");
    assert_eq!(
        header,
        "number,client,status,issueDate,dueDate,taxRate,notes,items,total"
    );
}

#[test]
fn json_export_wraps_records_with_metadata() {
    let json = export_json(&Shipment::seed(), "2024-06-01T00:00:00Z").expect("json export");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["exportDate"], "2024-06-01T00:00:00Z");
    assert_eq!(value["entity"], "shipment");
    assert_eq!(value["records"].as_array().map(Vec::len), Some(3));
    assert!(value["records"][0].get("trackingNumber").is_some());
}

#[test]
fn template_has_editable_header_and_sample_row() {
    let template = template_csv::<Product>();
    let batch = decode_csv::<Product>(&template).expect("template should decode");
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].sku, Product::seed()[0].sku);
    assert!(!template.lines().next().unwrap_or_default().contains("revenue"));
}

#[test]
fn csv_header_matches_labels_and_reports_unknown_columns() {
    let input = "Invoice Number,CLIENT,status,Colour\nINV-9,Acme,draft,red\n";
    let batch = decode_csv::<Invoice>(input).expect("csv should decode");
    assert_eq!(batch.ignored_columns, vec!["Colour"]);
    assert_eq!(batch.records[0].number, "INV-9");
    assert_eq!(batch.records[0].client, "Acme");
}

#[test]
fn csv_without_known_columns_is_rejected() {
    let err = decode_csv::<Invoice>("colour,size\nred,xl\n").expect_err("should fail");
    assert!(matches!(err, TransferError::NoKnownColumns { entity: "invoice" }));
}

#[test]
fn partial_import_appends_good_rows_and_reports_bad_lines() {
    let storage = MemoryStorage::default();
    let mut store = empty_store::<Invoice>(&storage);
    let input = "number,client,status\nINV-1,Acme,sent\nINV-2,,sent\nINV-3,Initech,bogus\nINV-4,Umbrella,paid\n";

    let batch = decode_csv::<Invoice>(input).expect("csv should decode");
    let summary = apply(&mut store, batch, "invoices.csv", ImportOptions::default())
        .expect("import should run");

    assert_eq!(summary.status, "partial");
    assert_eq!(summary.processed_count, 4);
    assert_eq!(summary.imported_count, 2);
    assert_eq!(summary.error_count, 2);
    assert_eq!(summary.errors[0].row, 3);
    assert_eq!(summary.errors[1].row, 4);
    assert_eq!(store.len(), 2);
    assert!(store.records().iter().all(|record| !record.id.is_empty()));

    let reloaded = RecordStore::<Invoice>::load(&storage, CorruptPolicy::Fail).expect("reload");
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn strict_import_writes_nothing_when_any_row_fails() {
    let storage = MemoryStorage::default();
    let mut store = empty_store::<Invoice>(&storage);
    let input = "number,client,status\nINV-1,Acme,sent\nINV-2,,sent\n";

    let batch = decode_csv::<Invoice>(input).expect("csv should decode");
    let options = ImportOptions {
        strict: true,
        dry_run: false,
    };
    let summary = apply(&mut store, batch, "invoices.csv", options).expect("import should run");

    assert_eq!(summary.status, "failed");
    assert_eq!(summary.imported_count, 0);
    assert_eq!(
        storage.get_item("invoices").expect("read").as_deref(),
        Some("[]")
    );
}

#[test]
fn dry_run_counts_valid_rows_without_writing() {
    let storage = MemoryStorage::default();
    let mut store = empty_store::<Invoice>(&storage);
    let batch = decode_csv::<Invoice>("number,client,status\nINV-1,Acme,sent\n")
        .expect("csv should decode");
    let options = ImportOptions {
        strict: false,
        dry_run: true,
    };
    let summary = apply(&mut store, batch, "invoices.csv", options).expect("import should run");

    assert_eq!(summary.status, "dry_run");
    assert_eq!(summary.imported_count, 1);
    assert!(summary.imported_ids.is_empty());
    assert_eq!(store.len(), 0);
}

#[test]
fn json_import_accepts_export_wrapper_and_keeps_unique_ids() {
    let storage = MemoryStorage::default();
    let mut store = empty_store::<Invoice>(&storage);
    store
        .add(Invoice {
            id: "inv-1".to_string(),
            ..Invoice::default()
        })
        .expect("add should succeed");

    let json = export_json(&Invoice::seed(), "2024-06-01T00:00:00Z").expect("json export");
    let batch = decode_json::<Invoice>(&json).expect("json should decode");
    let summary = apply(&mut store, batch, "invoices.json", ImportOptions::default())
        .expect("import should run");

    assert_eq!(summary.status, "completed");
    assert_eq!(summary.imported_ids.len(), 3);
    assert_ne!(summary.imported_ids[0], "inv-1");
    assert_eq!(summary.imported_ids[1], "inv-2");
    assert_eq!(store.records()[2].items, Invoice::seed()[1].items);
}

#[test]
fn json_import_reports_malformed_elements() {
    let input = r#"[
        {"number": "INV-5", "client": "Acme", "status": "draft"},
        {"number": "INV-6", "client": "Acme", "status": "draft", "taxRate": "high"}
    ]"#;
    let batch = decode_json::<Invoice>(input).expect("json should decode");
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.errors[0].row, 2);

    let err = decode_json::<Invoice>(r#"{"items": []}"#).expect_err("should fail");
    assert!(matches!(err, TransferError::UnexpectedJson(_)));
}

#[test]
fn json_rows_meet_the_same_constraints_as_csv_rows() {
    let input = r#"[
        {"number": "INV-7", "client": "Acme", "status": "sent", "dueDate": "2024-05-01"},
        {"number": "INV-8", "client": "Acme", "status": "bogus"},
        {"number": "", "client": "Acme", "status": "paid"},
        {"number": "INV-9", "client": "Acme", "status": "paid", "dueDate": "05/01/2024"}
    ]"#;
    let batch = decode_json::<Invoice>(input).expect("json should decode");

    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].number, "INV-7");
    let rows: Vec<usize> = batch.errors.iter().map(|error| error.row).collect();
    assert_eq!(rows, vec![2, 3, 4]);
    assert!(batch.errors[0].message.contains("draft|sent|paid|overdue"));
    assert!(batch.errors[1].message.contains("'number' is required"));
}

#[test]
fn csv_rows_with_malformed_items_are_rejected() {
    let input = "number,client,status,items\nINV-1,Acme,sent,\"[{\"\"quantity\"\": \"\"two\"\"}]\"\nINV-2,Acme,sent,\n";
    let batch = decode_csv::<Invoice>(input).expect("csv should decode");
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].number, "INV-2");
    assert_eq!(batch.errors[0].row, 2);
    assert!(batch.errors[0].message.contains("'items'"));
}

#[test]
fn file_format_follows_extension() {
    use super::FileFormat;
    use std::path::Path;

    assert_eq!(FileFormat::from_path(Path::new("out/Invoices.JSON")), FileFormat::Json);
    assert_eq!(FileFormat::from_path(Path::new("invoices.csv")), FileFormat::Csv);
    assert_eq!(FileFormat::from_path(Path::new("invoices")), FileFormat::Csv);
}
