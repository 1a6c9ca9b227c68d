use super::{
    blank_form, edit_form, parse_float_prefix, parse_int_prefix, submit, submit_edit, FormError,
    FormValues,
};
use crate::domain::{Invoice, Product, Project, Record};

fn form(pairs: &[(&str, &str)]) -> FormValues {
    let mut values = FormValues::new();
    for (key, value) in pairs {
        values.insert(*key, *value);
    }
    values
}

#[test]
fn parse_float_prefix_follows_lenient_rules() {
    assert_eq!(parse_float_prefix("42"), Some(42.0));
    assert_eq!(parse_float_prefix("  3.5kg"), Some(3.5));
    assert_eq!(parse_float_prefix("-.25"), Some(-0.25));
    assert_eq!(parse_float_prefix("1e3 units"), Some(1000.0));
    assert_eq!(parse_float_prefix("7e"), Some(7.0));
    assert_eq!(parse_float_prefix("12,5"), Some(12.0));
    assert_eq!(parse_float_prefix("abc"), None);
    assert_eq!(parse_float_prefix(""), None);
    assert_eq!(parse_float_prefix("."), None);
}

#[test]
fn parse_int_prefix_stops_at_first_non_digit() {
    assert_eq!(parse_int_prefix("15 pcs"), Some(15));
    assert_eq!(parse_int_prefix("-4"), Some(-4));
    assert_eq!(parse_int_prefix("3.9"), Some(3));
    assert_eq!(parse_int_prefix("x1"), None);
}

#[test]
fn blank_form_lists_every_editable_field() {
    let values = blank_form::<Invoice>();
    let keys: Vec<&str> = values.iter().map(|(key, _)| key).collect();
    assert!(keys.contains(&"number"));
    assert!(keys.contains(&"taxRate"));
    assert!(!keys.contains(&"total"));
    assert_eq!(values.get("taxRate"), Some("0"));
}

#[test]
fn edit_form_prefills_record_values() {
    let project = Project::seed().remove(0);
    let values = edit_form(&project);
    assert_eq!(values.get("name"), Some("Website Redesign"));
    assert_eq!(values.get("budget"), Some("45000"));
}

#[test]
fn submit_coerces_numbers_and_defaults_failures_to_zero() {
    let product = submit(
        Product::default(),
        &form(&[
            ("sku", "RG-9"),
            ("name", "Band"),
            ("category", "ring"),
            ("price", "199.99 USD"),
            ("stock", "many"),
            ("unitsSold", "7.8"),
        ]),
    )
    .expect("submit should succeed");
    assert_eq!(product.price, 199.99);
    assert_eq!(product.stock, 0);
    assert_eq!(product.units_sold, 7);
}

#[test]
fn submit_enforces_required_fields() {
    let err = submit(
        Invoice::default(),
        &form(&[("number", "INV-1"), ("client", "  "), ("status", "draft")]),
    )
    .expect_err("blank client should fail");
    assert_eq!(err, FormError::Required("client"));
}

#[test]
fn submit_validates_dates_and_choices() {
    let err = submit(
        Invoice::default(),
        &form(&[
            ("number", "INV-1"),
            ("client", "Acme"),
            ("status", "draft"),
            ("dueDate", "31/12/2024"),
        ]),
    )
    .expect_err("bad date should fail");
    assert!(matches!(err, FormError::InvalidDate { field: "dueDate", .. }));

    let err = submit(
        Invoice::default(),
        &form(&[("number", "INV-1"), ("client", "Acme"), ("status", "void")]),
    )
    .expect_err("bad status should fail");
    assert!(err.to_string().contains("draft|sent|paid|overdue"));
}

#[test]
fn submit_does_not_check_cross_field_order() {
    let invoice = submit(
        Invoice::default(),
        &form(&[
            ("number", "INV-1"),
            ("client", "Acme"),
            ("status", "draft"),
            ("issueDate", "2024-05-01"),
            ("dueDate", "2024-01-01"),
        ]),
    )
    .expect("due before issue is accepted");
    assert_eq!(invoice.due_date, "2024-01-01");
}

#[test]
fn submit_rejects_unknown_and_computed_fields() {
    let err = submit(Invoice::default(), &form(&[("colour", "red")])).expect_err("unknown");
    assert!(matches!(err, FormError::UnknownField { .. }));

    let err = submit(Invoice::default(), &form(&[("total", "5")])).expect_err("computed");
    assert_eq!(err, FormError::ReadOnlyField("total".to_string()));
}

#[test]
fn submit_edit_changes_only_supplied_fields() {
    let invoice = Invoice::seed().remove(1);
    let edited = submit_edit(invoice.clone(), &form(&[("status", "paid")]))
        .expect("edit should succeed");
    assert_eq!(edited.status, "paid");
    assert_eq!(edited.client, invoice.client);
    assert_eq!(edited.items, invoice.items);
    assert_eq!(edited.id, invoice.id);
}

#[test]
fn assignments_split_on_first_equals() {
    let values = FormValues::from_assignments(["notes=a=b", " client =Acme"])
        .expect("assignments should parse");
    assert_eq!(values.get("notes"), Some("a=b"));
    assert_eq!(values.get("client"), Some("Acme"));

    let err = FormValues::from_assignments(["novalue"]).expect_err("should fail");
    assert_eq!(err, FormError::MalformedAssignment("novalue".to_string()));
}
