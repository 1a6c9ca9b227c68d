use serde::{Deserialize, Serialize};

use super::record::{take_number, take_text, FieldSpec, FieldValue, Record, Schema};

/// Line items as they appear in a `list` field: a compact JSON array.
fn items_json(items: &[LineItem]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn take_items(slot: &mut Vec<LineItem>, value: FieldValue) -> bool {
    let FieldValue::Text(raw) = value else {
        return false;
    };
    if raw.trim().is_empty() {
        slot.clear();
        return true;
    }
    match serde_json::from_str::<Vec<LineItem>>(&raw) {
        Ok(items) => {
            *slot = items;
            true
        }
        Err(_) => false,
    }
}

pub const INVOICE_STATUSES: &[&str] = &["draft", "sent", "paid", "overdue"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl LineItem {
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub client: String,
    pub status: String,
    pub issue_date: String,
    pub due_date: String,
    pub tax_rate: f64,
    pub notes: String,
    pub items: Vec<LineItem>,
}

impl Invoice {
    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .fold(0.0, |subtotal, item| subtotal + item.amount())
    }

    /// Rounded to cents. Adding `0.0` turns a `-0.0` into `0`.
    pub fn total(&self) -> f64 {
        let total = self.subtotal() * (1.0 + self.tax_rate / 100.0);
        (total * 100.0).round() / 100.0 + 0.0
    }
}

static INVOICE_FIELDS: [FieldSpec; 9] = [
    FieldSpec::text("number", "Invoice Number").required(),
    FieldSpec::text("client", "Client").required(),
    FieldSpec::choice("status", "Status", INVOICE_STATUSES).required(),
    FieldSpec::date("issueDate", "Issue Date"),
    FieldSpec::date("dueDate", "Due Date"),
    FieldSpec::number("taxRate", "Tax Rate (%)"),
    FieldSpec::text("notes", "Notes"),
    FieldSpec::list("items", "Line Items"),
    FieldSpec::number("total", "Total").computed(),
];

static INVOICE_SCHEMA: Schema = Schema {
    entity: "invoice",
    storage_key: "invoices",
    id_prefix: "inv",
    fields: &INVOICE_FIELDS,
    search_fields: &["number", "client", "notes"],
    filter_field: Some("status"),
    list_columns: &["number", "client", "status", "dueDate", "total"],
    paginated: true,
};

impl Record for Invoice {
    fn schema() -> &'static Schema {
        &INVOICE_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::text(&self.id),
            "number" => FieldValue::text(&self.number),
            "client" => FieldValue::text(&self.client),
            "status" => FieldValue::text(&self.status),
            "issueDate" => FieldValue::text(&self.issue_date),
            "dueDate" => FieldValue::text(&self.due_date),
            "taxRate" => FieldValue::Number(self.tax_rate),
            "notes" => FieldValue::text(&self.notes),
            "items" => FieldValue::Text(items_json(&self.items)),
            "total" => FieldValue::Number(self.total()),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match field {
            "number" => take_text(&mut self.number, value),
            "client" => take_text(&mut self.client, value),
            "status" => take_text(&mut self.status, value),
            "issueDate" => take_text(&mut self.issue_date, value),
            "dueDate" => take_text(&mut self.due_date, value),
            "taxRate" => take_number(&mut self.tax_rate, value),
            "notes" => take_text(&mut self.notes, value),
            "items" => take_items(&mut self.items, value),
            _ => false,
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Invoice {
                id: "inv-1".to_string(),
                number: "INV-2024-001".to_string(),
                client: "Acme Corp".to_string(),
                status: "paid".to_string(),
                issue_date: "2024-01-05".to_string(),
                due_date: "2024-02-04".to_string(),
                tax_rate: 8.0,
                notes: "Phase one milestone".to_string(),
                items: vec![
                    LineItem {
                        description: "Design sprint".to_string(),
                        quantity: 1.0,
                        unit_price: 4500.0,
                    },
                    LineItem {
                        description: "Consulting hours".to_string(),
                        quantity: 10.0,
                        unit_price: 150.0,
                    },
                ],
            },
            Invoice {
                id: "inv-2".to_string(),
                number: "INV-2024-002".to_string(),
                client: "Globex".to_string(),
                status: "sent".to_string(),
                issue_date: "2024-02-10".to_string(),
                due_date: "2024-03-11".to_string(),
                tax_rate: 0.0,
                notes: String::new(),
                items: vec![LineItem {
                    description: "Discovery workshop".to_string(),
                    quantity: 2.0,
                    unit_price: 1200.0,
                }],
            },
            Invoice {
                id: "inv-3".to_string(),
                number: "INV-2024-003".to_string(),
                client: "Initech".to_string(),
                status: "overdue".to_string(),
                issue_date: "2023-12-01".to_string(),
                due_date: "2023-12-31".to_string(),
                tax_rate: 5.5,
                notes: "Second reminder sent".to_string(),
                items: vec![LineItem {
                    description: "Support retainer".to_string(),
                    quantity: 3.0,
                    unit_price: 800.0,
                }],
            },
        ]
    }
}
