use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Naira;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderChannel {
    Online,
    WalkIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: Option<String>,
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub address: String,
    pub order_details: String,
    /// Category whose stock was reserved for this order.
    pub category: String,
    pub quantity: u32,
    pub unit_price: Naira,
    pub total_amount: Naira,
    #[serde(default)]
    pub weight_per_unit: Option<f64>,
    pub status: OrderStatus,
    pub channel: OrderChannel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// First eight characters of the id, upper-cased, as printed on receipts.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect::<String>().to_uppercase()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}
