use serde::{Deserialize, Serialize};

use super::record::{take_integer, take_number, take_text, FieldSpec, FieldValue, Record, Schema};

pub const PRODUCT_CATEGORIES: &[&str] = &["ring", "necklace", "bracelet", "earrings", "watch"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub material: String,
    pub price: f64,
    pub stock: i64,
    pub units_sold: i64,
}

impl Product {
    pub fn revenue(&self) -> f64 {
        self.price * self.units_sold as f64
    }
}

static PRODUCT_FIELDS: [FieldSpec; 8] = [
    FieldSpec::text("sku", "SKU").required(),
    FieldSpec::text("name", "Product Name").required(),
    FieldSpec::choice("category", "Category", PRODUCT_CATEGORIES).required(),
    FieldSpec::text("material", "Material"),
    FieldSpec::number("price", "Price"),
    FieldSpec::integer("stock", "In Stock"),
    FieldSpec::integer("unitsSold", "Units Sold"),
    FieldSpec::number("revenue", "Revenue").computed(),
];

static PRODUCT_SCHEMA: Schema = Schema {
    entity: "product",
    storage_key: "jewelryProducts",
    id_prefix: "jwl",
    fields: &PRODUCT_FIELDS,
    search_fields: &["sku", "name", "material"],
    filter_field: Some("category"),
    list_columns: &["name", "sku", "category", "price", "stock", "revenue"],
    paginated: false,
};

impl Record for Product {
    fn schema() -> &'static Schema {
        &PRODUCT_SCHEMA
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
            "sku" => FieldValue::text(&self.sku),
            "name" => FieldValue::text(&self.name),
            "category" => FieldValue::text(&self.category),
            "material" => FieldValue::text(&self.material),
            "price" => FieldValue::Number(self.price),
            "stock" => FieldValue::Integer(self.stock),
            "unitsSold" => FieldValue::Integer(self.units_sold),
            "revenue" => FieldValue::Number(self.revenue()),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match field {
            "sku" => take_text(&mut self.sku, value),
            "name" => take_text(&mut self.name, value),
            "category" => take_text(&mut self.category, value),
            "material" => take_text(&mut self.material, value),
            "price" => take_number(&mut self.price, value),
            "stock" => take_integer(&mut self.stock, value),
            "unitsSold" => take_integer(&mut self.units_sold, value),
            _ => false,
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Product {
                id: "jwl-1".to_string(),
                sku: "RG-001".to_string(),
                name: "Solitaire Ring".to_string(),
                category: "ring".to_string(),
                material: "Platinum".to_string(),
                price: 2400.0,
                stock: 12,
                units_sold: 38,
            },
            Product {
                id: "jwl-2".to_string(),
                sku: "NK-014".to_string(),
                name: "Pearl Strand".to_string(),
                category: "necklace".to_string(),
                material: "Akoya pearl".to_string(),
                price: 1150.0,
                stock: 5,
                units_sold: 21,
            },
            Product {
                id: "jwl-3".to_string(),
                sku: "BR-007".to_string(),
                name: "Tennis Bracelet".to_string(),
                category: "bracelet".to_string(),
                material: "White gold".to_string(),
                price: 3100.0,
                stock: 3,
                units_sold: 9,
            },
        ]
    }
}
