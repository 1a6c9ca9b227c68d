use serde::{Deserialize, Serialize};

use super::record::{take_number, take_text, FieldSpec, FieldValue, Record, Schema};

pub const SHIPMENT_STATUSES: &[&str] = &["pending", "in_transit", "delivered", "delayed"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shipment {
    pub id: String,
    pub tracking_number: String,
    pub origin: String,
    pub destination: String,
    pub carrier: String,
    pub status: String,
    pub weight_kg: f64,
    pub eta: String,
}

static SHIPMENT_FIELDS: [FieldSpec; 7] = [
    FieldSpec::text("trackingNumber", "Tracking Number").required(),
    FieldSpec::text("origin", "Origin").required(),
    FieldSpec::text("destination", "Destination").required(),
    FieldSpec::text("carrier", "Carrier"),
    FieldSpec::choice("status", "Status", SHIPMENT_STATUSES).required(),
    FieldSpec::number("weightKg", "Weight (kg)"),
    FieldSpec::date("eta", "ETA"),
];

static SHIPMENT_SCHEMA: Schema = Schema {
    entity: "shipment",
    storage_key: "supplyChainShipments",
    id_prefix: "shp",
    fields: &SHIPMENT_FIELDS,
    search_fields: &["trackingNumber", "origin", "destination", "carrier"],
    filter_field: Some("status"),
    list_columns: &["trackingNumber", "origin", "destination", "status", "eta"],
    paginated: false,
};

impl Record for Shipment {
    fn schema() -> &'static Schema {
        &SHIPMENT_SCHEMA
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
            "trackingNumber" => FieldValue::text(&self.tracking_number),
            "origin" => FieldValue::text(&self.origin),
            "destination" => FieldValue::text(&self.destination),
            "carrier" => FieldValue::text(&self.carrier),
            "status" => FieldValue::text(&self.status),
            "weightKg" => FieldValue::Number(self.weight_kg),
            "eta" => FieldValue::text(&self.eta),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match field {
            "trackingNumber" => take_text(&mut self.tracking_number, value),
            "origin" => take_text(&mut self.origin, value),
            "destination" => take_text(&mut self.destination, value),
            "carrier" => take_text(&mut self.carrier, value),
            "status" => take_text(&mut self.status, value),
            "weightKg" => take_number(&mut self.weight_kg, value),
            "eta" => take_text(&mut self.eta, value),
            _ => false,
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Shipment {
                id: "shp-1".to_string(),
                tracking_number: "TRK-10042".to_string(),
                origin: "Shenzhen".to_string(),
                destination: "Rotterdam".to_string(),
                carrier: "Maersk".to_string(),
                status: "in_transit".to_string(),
                weight_kg: 1250.0,
                eta: "2024-04-18".to_string(),
            },
            Shipment {
                id: "shp-2".to_string(),
                tracking_number: "TRK-10043".to_string(),
                origin: "Hamburg".to_string(),
                destination: "Chicago".to_string(),
                carrier: "DHL".to_string(),
                status: "delivered".to_string(),
                weight_kg: 320.5,
                eta: "2024-03-02".to_string(),
            },
            Shipment {
                id: "shp-3".to_string(),
                tracking_number: "TRK-10044".to_string(),
                origin: "Santos".to_string(),
                destination: "Lisbon".to_string(),
                carrier: "MSC".to_string(),
                status: "delayed".to_string(),
                weight_kg: 2800.0,
                eta: "2024-05-09".to_string(),
            },
        ]
    }
}
