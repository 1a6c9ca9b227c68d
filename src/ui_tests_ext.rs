use super::{
    format_detail, format_footer, format_table, is_yes, query_summary, status_color_code, Cell,
    Palette,
};
use crate::query::{FieldFilter, PageInfo, RecordQuery, SortDirection, SortSpec};

#[test]
fn table_pads_columns_and_flattens_newlines() {
    let rows = vec![
        vec![Cell::plain("inv-1"), Cell::status("paid"), Cell::plain("two\nlines")],
        vec![Cell::plain("inv-22"), Cell::status("overdue"), Cell::plain("x")],
    ];
    let table = format_table(&["id", "status", "notes"], &rows, &Palette::plain());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "ID      STATUS   NOTES");
    assert_eq!(lines[1], "inv-1   paid     two lines");
    assert_eq!(lines[2], "inv-22  overdue  x");
}

#[test]
fn empty_table_shows_placeholder_row() {
    let table = format_table(&["id", "name"], &[], &Palette::plain());
    assert_eq!(table, "ID  NAME\nno records\n");
}

#[test]
fn footer_mentions_matches_and_page() {
    assert_eq!(format_footer(3, 3, 3, None), "3 of 3 record(s)");
    let page = PageInfo {
        number: 2,
        size: 10,
        page_count: 4,
    };
    assert_eq!(
        format_footer(10, 35, 40, Some(page)),
        "10 of 40 record(s) (35 matched) - page 2/4"
    );
}

#[test]
fn query_summary_formats_only_active_settings() {
    let query = RecordQuery {
        search: Some(" acme ".to_string()),
        filter: Some(FieldFilter {
            field: "status".to_string(),
            value: "paid".to_string(),
        }),
        sort: Some(SortSpec {
            field: "total".to_string(),
            direction: SortDirection::Desc,
        }),
        page: None,
    };
    assert_eq!(
        query_summary(&query).expect("summary should exist"),
        "search=acme status=paid sort=total:desc"
    );

    let idle = RecordQuery {
        filter: Some(FieldFilter {
            field: "status".to_string(),
            value: "all".to_string(),
        }),
        ..RecordQuery::default()
    };
    assert!(query_summary(&idle).is_none());
}

#[test]
fn detail_aligns_labels() {
    let rows = vec![
        ("Client".to_string(), "Acme".to_string()),
        ("Tax Rate (%)".to_string(), "8".to_string()),
    ];
    assert_eq!(
        format_detail(&rows, &Palette::plain()),
        "Client        Acme\nTax Rate (%)  8\n"
    );
}

#[test]
fn dark_mode_brightens_status_colors() {
    assert_eq!(status_color_code("paid", false), "32");
    assert_eq!(status_color_code("PAID", true), "92");
    assert_eq!(status_color_code("overdue", true), "91");
    assert_eq!(status_color_code("mystery", true), "0");
}

#[test]
fn only_yes_answers_confirm() {
    assert!(is_yes("y\n"));
    assert!(is_yes(" YES "));
    assert!(!is_yes("\n"));
    assert!(!is_yes("nope"));
}
