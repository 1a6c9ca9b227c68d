pub mod invoices;
pub mod portfolio;
pub mod products;
pub mod projects;
pub mod record;
pub mod shipments;

use std::error::Error;
use std::fmt;
use std::str::FromStr;

pub use invoices::{Invoice, LineItem};
pub use portfolio::PortfolioCompany;
pub use products::Product;
pub use projects::{Project, Task};
pub use record::{FieldKind, FieldSpec, FieldValue, Record, Schema};
pub use shipments::Shipment;

/// One collection per dashboard entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Projects,
    Tasks,
    Invoices,
    Shipments,
    Companies,
    Products,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Projects,
        EntityKind::Tasks,
        EntityKind::Invoices,
        EntityKind::Shipments,
        EntityKind::Companies,
        EntityKind::Products,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Projects => "projects",
            EntityKind::Tasks => "tasks",
            EntityKind::Invoices => "invoices",
            EntityKind::Shipments => "shipments",
            EntityKind::Companies => "companies",
            EntityKind::Products => "products",
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            EntityKind::Projects => Project::schema(),
            EntityKind::Tasks => Task::schema(),
            EntityKind::Invoices => Invoice::schema(),
            EntityKind::Shipments => Shipment::schema(),
            EntityKind::Companies => PortfolioCompany::schema(),
            EntityKind::Products => Product::schema(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "projects" | "project" => EntityKind::Projects,
            "tasks" | "task" => EntityKind::Tasks,
            "invoices" | "invoice" => EntityKind::Invoices,
            "shipments" | "shipment" => EntityKind::Shipments,
            "companies" | "company" | "portfolio" => EntityKind::Companies,
            "products" | "product" | "jewelry" => EntityKind::Products,
            _ => {
                return Err(ParseEntityKindError {
                    value: value.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityKindError {
    value: String,
}

impl fmt::Display for ParseEntityKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = EntityKind::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "unknown entity '{}', expected one of: {}",
            self.value, expected
        )
    }
}

impl Error for ParseEntityKindError {}
