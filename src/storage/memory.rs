use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{
    AboutContent, Category, ContactSettings, HomepageContent, LegalContent, Listing,
    LivestockPageHeader, Order, RevenueTotals, Review, StaffMember,
};
use crate::storage::json::SnapshotFile;

const CHANGE_BUFFER: usize = 256;

/// Every collection and singleton document the storefront owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub listings: BTreeMap<String, Listing>,
    pub categories: BTreeMap<String, Category>,
    pub orders: BTreeMap<String, Order>,
    pub staff: BTreeMap<String, StaffMember>,
    pub reviews: BTreeMap<String, Review>,
    pub homepage: HomepageContent,
    pub about: AboutContent,
    pub legal: LegalContent,
    pub contact: ContactSettings,
    pub livestock_page: LivestockPageHeader,
    pub revenue: RevenueTotals,
}

impl Database {
    pub fn category_named(&self, name: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.matches(name))
    }

    pub fn category_named_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.values_mut().find(|c| c.matches(name))
    }

    pub fn category_mut(&mut self, id: &str) -> Result<&mut Category> {
        self.categories
            .get_mut(id)
            .ok_or_else(|| Error::not_found("category", id))
    }

    pub fn listing_mut(&mut self, id: &str) -> Result<&mut Listing> {
        self.listings
            .get_mut(id)
            .ok_or_else(|| Error::not_found("listing", id))
    }

    pub fn order_mut(&mut self, id: &str) -> Result<&mut Order> {
        self.orders
            .get_mut(id)
            .ok_or_else(|| Error::not_found("order", id))
    }

    pub fn staff_with_email(&self, email: &str) -> Option<&StaffMember> {
        self.staff.values().find(|s| s.email.eq_ignore_ascii_case(email.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Listings,
    Categories,
    Orders,
    Staff,
    Reviews,
    Settings,
    Revenue,
}

/// Emitted once per changed document after a commit becomes visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub collection: Collection,
    pub id: String,
}

/// Document store with all-or-nothing multi-document transactions.
///
/// Writers are serialized on one lock. A transaction runs against a staged
/// copy; the copy is persisted and published only if the closure succeeds.
pub struct MemoryStore {
    state: RwLock<Database>,
    snapshot: Option<SnapshotFile>,
    changes: broadcast::Sender<Change>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_state(Database::default(), None)
    }

    fn with_state(db: Database, snapshot: Option<SnapshotFile>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            state: RwLock::new(db),
            snapshot,
            changes,
        }
    }

    /// Opens a store backed by a snapshot file, loading it when present.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let snapshot = SnapshotFile::new(path);
        let db = snapshot.load().await?.unwrap_or_default();
        info!(
            path = ?snapshot.path(),
            listings = db.listings.len(),
            categories = db.categories.len(),
            orders = db.orders.len(),
            "Opened store"
        );
        Ok(Self::with_state(db, Some(snapshot)))
    }

    pub async fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        let guard = self.state.read().await;
        f(&guard)
    }

    pub async fn transaction<T>(&self, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write().await;
        let mut staged = guard.clone();
        let value = f(&mut staged)?;

        let changes = diff(&guard, &staged);
        if changes.is_empty() {
            return Ok(value);
        }

        if let Some(snapshot) = &self.snapshot {
            snapshot.write(&staged).await?;
        }
        *guard = staged;
        drop(guard);

        debug!(changed = changes.len(), "Committed transaction");
        for change in changes {
            // No subscribers is not an error.
            let _ = self.changes.send(change);
        }
        Ok(value)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}

fn diff_map<V: PartialEq>(
    collection: Collection,
    before: &BTreeMap<String, V>,
    after: &BTreeMap<String, V>,
    out: &mut Vec<Change>,
) {
    for (id, value) in after {
        if before.get(id) != Some(value) {
            out.push(Change { collection, id: id.clone() });
        }
    }
    for id in before.keys() {
        if !after.contains_key(id) {
            out.push(Change { collection, id: id.clone() });
        }
    }
}

fn diff(before: &Database, after: &Database) -> Vec<Change> {
    let mut out = Vec::new();
    diff_map(Collection::Listings, &before.listings, &after.listings, &mut out);
    diff_map(Collection::Categories, &before.categories, &after.categories, &mut out);
    diff_map(Collection::Orders, &before.orders, &after.orders, &mut out);
    diff_map(Collection::Staff, &before.staff, &after.staff, &mut out);
    diff_map(Collection::Reviews, &before.reviews, &after.reviews, &mut out);

    let settings = [
        ("homepage", before.homepage != after.homepage),
        ("about", before.about != after.about),
        ("legal", before.legal != after.legal),
        ("contact", before.contact != after.contact),
        ("livestockPage", before.livestock_page != after.livestock_page),
    ];
    for (id, changed) in settings {
        if changed {
            out.push(Change { collection: Collection::Settings, id: id.to_string() });
        }
    }
    if before.revenue != after.revenue {
        out.push(Change { collection: Collection::Revenue, id: "totals".to_string() });
    }
    out
}
