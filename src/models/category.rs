use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Naira;

/// Bookkeeping unit: one price and one stock counter per animal kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub unit_price: Naira,
    pub stock_qty: i64,
    #[serde(default)]
    pub listing_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, unit_price: Naira, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            unit_price,
            stock_qty: 0,
            listing_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}
