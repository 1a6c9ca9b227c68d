use std::path::PathBuf;

use uuid::Uuid;

use super::{App, AppError};
use crate::config::Config;
use crate::domain::{Invoice, LineItem, Project, Record, Task};
use crate::form::{FormError, FormValues};
use crate::query::{FieldFilter, RecordQuery};
use crate::store::{CorruptPolicy, StoreError};
use crate::transfer::{FileFormat, ImportOptions};

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("recordbook-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn open_app(root: &std::path::Path) -> App {
    let db_path = root.join(".recordbook/storage.sqlite");
    App::open(db_path.to_str().expect("utf8 path"), Config::default()).expect("app should open")
}

fn assignments(pairs: &[&str]) -> FormValues {
    FormValues::from_assignments(pairs.iter().copied()).expect("assignments should parse")
}

#[test]
fn init_seeds_every_collection_once() {
    let root = unique_workspace();
    let app = open_app(&root);

    let counts = app.init_collections().expect("init should succeed");
    assert_eq!(counts.len(), 6);
    assert!(counts.iter().all(|count| count.count == 3 && count.seeded));

    app.clear::<Invoice>().expect("clear should succeed");
    let counts = app.init_collections().expect("second init should succeed");
    let invoices = counts
        .iter()
        .find(|count| count.storage_key == "invoices")
        .expect("invoice count");
    assert_eq!(invoices.count, 0);
    assert!(counts.iter().all(|count| !count.seeded));
}

#[test]
fn reseed_restores_seed_records_after_clear() {
    let root = unique_workspace();
    let app = open_app(&root);

    let mine: Task = app
        .create(&assignments(&["title=Write notes", "projectId=prj-1", "status=todo"]))
        .expect("create should succeed");
    app.clear::<Invoice>().expect("clear should succeed");

    assert_eq!(app.reseed::<Invoice>().expect("reseed should succeed"), 3);
    assert_eq!(app.reseed::<Task>().expect("reseed should succeed"), 3);
    assert!(matches!(
        app.show::<Task>(&mine.id),
        Err(AppError::Store(StoreError::NotFound { .. }))
    ));

    let counts = app.init_collections().expect("init should succeed");
    assert!(counts.iter().all(|count| count.count == 3 && !count.seeded));
}

#[test]
fn create_update_show_and_remove_round_trip() {
    let root = unique_workspace();
    let app = open_app(&root);

    let created: Invoice = app
        .create(&assignments(&["number=INV-9", "client=Umbrella", "status=draft"]))
        .expect("create should succeed");
    assert!(created.id.starts_with("inv-"));

    let updated: Invoice = app
        .update(&created.id, &assignments(&["status=sent", "taxRate=12.5%"]))
        .expect("update should succeed");
    assert_eq!(updated.status, "sent");
    assert_eq!(updated.tax_rate, 12.5);
    assert_eq!(updated.client, "Umbrella");

    let shown: Invoice = app.show(&created.id).expect("show should succeed");
    assert_eq!(shown, updated);

    let removed: Invoice = app.remove(&created.id).expect("remove should succeed");
    assert_eq!(removed.id, created.id);
    assert!(matches!(
        app.show::<Invoice>(&created.id),
        Err(AppError::Store(StoreError::NotFound { .. }))
    ));
}

#[test]
fn failed_update_leaves_record_untouched() {
    let root = unique_workspace();
    let app = open_app(&root);

    let err = app
        .update::<Invoice>("inv-2", &assignments(&["status=void"]))
        .expect_err("invalid status should fail");
    assert!(matches!(err, AppError::Form(FormError::InvalidChoice { .. })));
    let shown: Invoice = app.show("inv-2").expect("show should succeed");
    assert_eq!(shown.status, "sent");

    let err = app
        .update::<Invoice>("inv-2", &FormValues::new())
        .expect_err("empty update should fail");
    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[test]
fn list_applies_filter_and_rejects_unknown_sort_fields() {
    let root = unique_workspace();
    let app = open_app(&root);

    let query = RecordQuery {
        filter: Some(FieldFilter::on_default(Invoice::schema(), "paid").expect("filter")),
        ..RecordQuery::default()
    };
    let page = app.list::<Invoice>(&query).expect("list should succeed");
    assert_eq!(page.matched, 1);
    assert_eq!(page.items[0].client, "Acme Corp");

    let bad = RecordQuery {
        filter: Some(FieldFilter {
            field: "colour".to_string(),
            value: "red".to_string(),
        }),
        ..RecordQuery::default()
    };
    assert!(matches!(
        app.list::<Invoice>(&bad),
        Err(AppError::Query(_))
    ));
}

#[test]
fn cascading_project_removal_drops_its_tasks_atomically() {
    let root = unique_workspace();
    let app = open_app(&root);

    let removal = app
        .remove_project("prj-1", true)
        .expect("remove should succeed");
    assert_eq!(removal.project.id, "prj-1");
    assert_eq!(removal.removed_tasks.len(), 2);

    let tasks = app
        .list::<Task>(&RecordQuery::default())
        .expect("list should succeed");
    assert_eq!(tasks.items.len(), 1);
    assert_eq!(tasks.items[0].project_id, "prj-2");
    assert!(app.orphaned_tasks().expect("check").is_empty());
}

#[test]
fn plain_project_removal_leaves_orphans_for_check() {
    let root = unique_workspace();
    let app = open_app(&root);

    app.remove_project("prj-2", false)
        .expect("remove should succeed");
    let orphans = app.orphaned_tasks().expect("check should succeed");
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, "tsk-3");

    let projects: Vec<Project> = app.projects().expect("projects");
    assert_eq!(orphans[0].project_label(&projects), "Unknown project");

    let removed = app.remove_orphaned_tasks().expect("fix should succeed");
    assert_eq!(removed.len(), 1);
    assert!(app.orphaned_tasks().expect("check").is_empty());
}

#[test]
fn line_items_drive_invoice_total() {
    let root = unique_workspace();
    let app = open_app(&root);

    let invoice = app
        .add_line_item(
            "inv-2",
            LineItem {
                description: "Follow-up".to_string(),
                quantity: 1.0,
                unit_price: 600.0,
            },
        )
        .expect("add item should succeed");
    assert_eq!(invoice.items.len(), 2);
    assert_eq!(invoice.total(), 3000.0);

    let invoice = app
        .remove_line_item("inv-2", 1)
        .expect("remove item should succeed");
    assert_eq!(invoice.items[0].description, "Follow-up");

    assert!(matches!(
        app.remove_line_item("inv-2", 5),
        Err(AppError::InvalidArgument(_))
    ));
}

#[test]
fn non_finite_line_items_are_rejected_before_saving() {
    let root = unique_workspace();
    let app = open_app(&root);
    let mine: Invoice = app
        .create(&assignments(&["number=MINE-1", "client=Umbrella", "status=draft"]))
        .expect("create should succeed");

    for (quantity, unit_price) in [(1.0, f64::NAN), (f64::INFINITY, 10.0)] {
        let err = app
            .add_line_item(
                &mine.id,
                LineItem {
                    description: "Broken".to_string(),
                    quantity,
                    unit_price,
                },
            )
            .expect_err("non-finite item should fail");
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    let page = app
        .list::<Invoice>(&RecordQuery::default())
        .expect("list should succeed");
    assert_eq!(page.matched, 4);
    let shown: Invoice = app.show(&mine.id).expect("record should survive");
    assert!(shown.items.is_empty());
    assert_eq!(shown.total().to_string(), "0");
}

#[test]
fn export_then_import_appends_copies() {
    let root = unique_workspace();
    let app = open_app(&root);

    let csv = app
        .export::<Invoice>(FileFormat::Csv, &RecordQuery::default())
        .expect("export should succeed");
    let path = root.join("invoices.csv");
    std::fs::write(&path, csv).expect("write export");

    let summary = app
        .import::<Invoice>(&path, None, ImportOptions::default())
        .expect("import should succeed");
    assert_eq!(summary.status, "completed");
    assert_eq!(summary.imported_count, 3);
    assert_eq!(summary.source_type, "csv");

    let page = app
        .list::<Invoice>(&RecordQuery::default())
        .expect("list should succeed");
    assert_eq!(page.items.len(), 6);
}

#[test]
fn dark_mode_toggles_and_persists() {
    let root = unique_workspace();
    let app = open_app(&root);

    assert!(!app.dark_mode().expect("read"));
    assert!(app.toggle_dark_mode().expect("toggle"));
    drop(app);

    let reopened = open_app(&root);
    assert!(reopened.dark_mode().expect("read"));
    assert!(!reopened.set_dark_mode(false).expect("set"));
}

#[test]
fn corrupt_collection_follows_configured_policy() {
    let root = unique_workspace();
    let db_path = root.join("storage.sqlite");
    let db_path = db_path.to_str().expect("utf8 path");
    {
        let app = App::open(db_path, Config::default()).expect("app should open");
        app.init_collections().expect("init");
        app.storage
            .connection()
            .execute(
                "UPDATE local_storage SET value = 'oops' WHERE key = 'invoices'",
                [],
            )
            .expect("corrupt write");
    }

    let mut strict = Config::default();
    strict.storage.on_corrupt = CorruptPolicy::Fail;
    let app = App::open(db_path, strict).expect("app should open");
    assert!(matches!(
        app.list::<Invoice>(&RecordQuery::default()),
        Err(AppError::Store(StoreError::Corrupt { .. }))
    ));

    let app = App::open(db_path, Config::default()).expect("app should open");
    let page = app
        .list::<Invoice>(&RecordQuery::default())
        .expect("reseed should recover");
    assert_eq!(page.items.len(), 3);
}

#[test]
fn ai_context_carries_filtered_csv() {
    let root = unique_workspace();
    let app = open_app(&root);
    let query = RecordQuery {
        search: Some("globex".to_string()),
        ..RecordQuery::default()
    };
    let attachment = app.ai_context::<Invoice>(&query).expect("context");
    assert_eq!(attachment.name, "invoices.csv");
    assert_eq!(attachment.content.lines().count(), 2);
}
