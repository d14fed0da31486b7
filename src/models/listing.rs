use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Naira;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub breed: String,
    /// Category name, e.g. "Goat".
    pub category: String,
    pub price: Naira,
    pub description: String,
    pub specs: String,
    pub image_url: String,
    pub color: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub added_by: String,
}

impl Listing {
    /// Free-text line carried on an order, e.g. "Broiler (2kg, free range)".
    pub fn order_details(&self) -> String {
        if self.specs.trim().is_empty() {
            self.breed.clone()
        } else {
            format!("{} ({})", self.breed, self.specs)
        }
    }

    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.max(self.created_at)
    }
}

/// Admin form input for creating or editing a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub breed: String,
    /// Existing category name, or "other" together with `new_category`.
    pub category: String,
    #[serde(default)]
    pub new_category: Option<String>,
    pub price: Naira,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: String,
    pub image_url: String,
}
