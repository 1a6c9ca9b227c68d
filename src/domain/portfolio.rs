use serde::{Deserialize, Serialize};

use super::record::{take_number, take_text, FieldSpec, FieldValue, Record, Schema};

pub const COMPANY_STAGES: &[&str] = &["seed", "series_a", "series_b", "growth", "exited"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioCompany {
    pub id: String,
    pub name: String,
    pub sector: String,
    pub stage: String,
    pub invested: f64,
    pub valuation: f64,
    pub ownership_pct: f64,
    pub invested_on: String,
}

impl PortfolioCompany {
    /// Value of the held stake relative to the amount invested.
    pub fn multiple(&self) -> f64 {
        if self.invested <= 0.0 {
            return 0.0;
        }
        let stake = self.valuation * self.ownership_pct / 100.0;
        (stake / self.invested * 100.0).round() / 100.0
    }
}

static COMPANY_FIELDS: [FieldSpec; 8] = [
    FieldSpec::text("name", "Company").required(),
    FieldSpec::text("sector", "Sector"),
    FieldSpec::choice("stage", "Stage", COMPANY_STAGES).required(),
    FieldSpec::number("invested", "Invested"),
    FieldSpec::number("valuation", "Valuation"),
    FieldSpec::number("ownershipPct", "Ownership (%)"),
    FieldSpec::date("investedOn", "Investment Date"),
    FieldSpec::number("multiple", "MOIC").computed(),
];

static COMPANY_SCHEMA: Schema = Schema {
    entity: "company",
    storage_key: "portfolioCompanies",
    id_prefix: "pco",
    fields: &COMPANY_FIELDS,
    search_fields: &["name", "sector"],
    filter_field: Some("stage"),
    list_columns: &["name", "sector", "stage", "invested", "multiple"],
    paginated: false,
};

impl Record for PortfolioCompany {
    fn schema() -> &'static Schema {
        &COMPANY_SCHEMA
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
            "name" => FieldValue::text(&self.name),
            "sector" => FieldValue::text(&self.sector),
            "stage" => FieldValue::text(&self.stage),
            "invested" => FieldValue::Number(self.invested),
            "valuation" => FieldValue::Number(self.valuation),
            "ownershipPct" => FieldValue::Number(self.ownership_pct),
            "investedOn" => FieldValue::text(&self.invested_on),
            "multiple" => FieldValue::Number(self.multiple()),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match field {
            "name" => take_text(&mut self.name, value),
            "sector" => take_text(&mut self.sector, value),
            "stage" => take_text(&mut self.stage, value),
            "invested" => take_number(&mut self.invested, value),
            "valuation" => take_number(&mut self.valuation, value),
            "ownershipPct" => take_number(&mut self.ownership_pct, value),
            "investedOn" => take_text(&mut self.invested_on, value),
            _ => false,
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            PortfolioCompany {
                id: "pco-1".to_string(),
                name: "Northwind Robotics".to_string(),
                sector: "Industrial".to_string(),
                stage: "series_a".to_string(),
                invested: 2_000_000.0,
                valuation: 40_000_000.0,
                ownership_pct: 12.5,
                invested_on: "2022-06-01".to_string(),
            },
            PortfolioCompany {
                id: "pco-2".to_string(),
                name: "Bluefin Health".to_string(),
                sector: "Healthcare".to_string(),
                stage: "growth".to_string(),
                invested: 5_000_000.0,
                valuation: 150_000_000.0,
                ownership_pct: 6.0,
                invested_on: "2021-02-15".to_string(),
            },
            PortfolioCompany {
                id: "pco-3".to_string(),
                name: "Ledgerly".to_string(),
                sector: "Fintech".to_string(),
                stage: "seed".to_string(),
                invested: 500_000.0,
                valuation: 6_000_000.0,
                ownership_pct: 10.0,
                invested_on: "2023-09-20".to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::PortfolioCompany;

    #[test]
    fn multiple_compares_stake_to_investment() {
        let company = PortfolioCompany {
            invested: 1_000_000.0,
            valuation: 30_000_000.0,
            ownership_pct: 10.0,
            ..PortfolioCompany::default()
        };
        assert_eq!(company.multiple(), 3.0);
    }

    #[test]
    fn multiple_is_zero_without_investment() {
        assert_eq!(PortfolioCompany::default().multiple(), 0.0);
    }
}
