use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::pipeline::PipelineErrorKind;

pub type OfferId = String;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupplierRecord {
    #[serde(alias = "Код", deserialize_with = "cell::text")]
    pub code: String,
    #[serde(rename = "quantity", alias = "Количество", deserialize_with = "cell::text")]
    pub raw_quantity: String,
    #[serde(rename = "price", alias = "Цена", deserialize_with = "cell::text")]
    pub raw_price: String,
}

#[cfg(test)]
impl SupplierRecord {
    pub fn new(
        code: impl Into<String>,
        raw_quantity: impl Into<String>,
        raw_price: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            raw_quantity: raw_quantity.into(),
            raw_price: raw_price.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub offer_id: OfferId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub offer_id: OfferId,
    pub value: u64,
    pub currency: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct FailureReport {
    pub target: String,
    pub stage: String,
    pub kind: PipelineErrorKind,
    pub detail: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub stages: Vec<StageReport>,
    pub failures: Vec<FailureReport>,
}

impl SyncReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Spreadsheet exports hand us strings, numbers and `null` for blank cells in
/// the same column. Blank cells become empty strings and only fail once a
/// matched record is normalized.
mod cell {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Cell>::deserialize(deserializer)? {
            Some(Cell::Text(value)) => value,
            Some(Cell::Int(value)) => value.to_string(),
            Some(Cell::Float(value)) => value.to_string(),
            None => String::new(),
        })
    }
}
