use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Naira;

/// Running sales counters per calendar period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTotals {
    pub daily: Naira,
    pub weekly: Naira,
    pub monthly: Naira,
    pub yearly: Naira,
    pub last_update: Option<DateTime<Utc>>,
}

/// Which counters a rollover zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RolloverReport {
    pub daily: bool,
    pub weekly: bool,
    pub monthly: bool,
    pub yearly: bool,
}

impl RolloverReport {
    pub fn any(&self) -> bool {
        self.daily || self.weekly || self.monthly || self.yearly
    }
}
