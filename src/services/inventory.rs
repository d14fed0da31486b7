use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Category, Naira, Order, OrderChannel, OrderStatus};
use crate::services::access::{AccessControl, Actor};
use crate::storage::MemoryStore;

pub const DEFAULT_CATEGORIES: [&str; 5] = ["Cow", "Goat", "Fish", "Chicken", "Pig"];

const WALK_IN_ADDRESS: &str = "Walk-in Customer (In-Store)";

/// Text before the first "(", trimmed: "Broiler (2kg)" -> "Broiler".
pub fn derive_category(details: &str) -> String {
    details.split('(').next().unwrap_or_default().trim().to_string()
}

/// "gOAT " -> "Goat"
pub fn format_name(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn find_category<'a>(
    categories: impl IntoIterator<Item = &'a Category>,
    name: &str,
) -> Option<&'a Category> {
    categories.into_iter().find(|c| c.matches(name))
}

/// `unit_price * quantity`, refusing totals that do not fit in [`Naira`].
pub fn line_total(unit_price: Naira, quantity: u32) -> Result<Naira> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| Error::Validation(format!("total for {quantity} at {unit_price} is out of range")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub category: String,
    pub available: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkInSale {
    pub customer_name: String,
    pub phone: String,
    pub category: String,
    pub quantity: u32,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<MemoryStore>,
    access: AccessControl,
    offset: FixedOffset,
}

impl InventoryService {
    pub fn new(store: Arc<MemoryStore>, access: AccessControl, offset: FixedOffset) -> Self {
        Self { store, access, offset }
    }

    pub async fn list(&self) -> Vec<Category> {
        let mut categories: Vec<Category> =
            self.store.read(|db| db.categories.values().cloned().collect()).await;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    /// Advisory availability for the storefront. Orders re-check under the store lock.
    pub async fn stock_for(&self, details: &str) -> Option<StockLevel> {
        let wanted = derive_category(details);
        if wanted.is_empty() {
            return None;
        }
        self.store
            .read(|db| {
                find_category(db.categories.values(), &wanted).map(|c| StockLevel {
                    category: c.name.clone(),
                    available: c.stock_qty,
                })
            })
            .await
    }

    /// Creates whichever default categories are missing; returns the ones created.
    pub async fn initialize_defaults(&self, actor: Option<&Actor>, now: DateTime<Utc>) -> Result<Vec<Category>> {
        self.access.require_staff(actor).await?;
        let created = self
            .store
            .transaction(|db| {
                let mut created = Vec::new();
                for name in DEFAULT_CATEGORIES {
                    if db.category_named(name).is_none() {
                        let category = Category::new(name, 0, now);
                        db.categories.insert(category.id.clone(), category.clone());
                        created.push(category);
                    }
                }
                Ok(created)
            })
            .await?;
        info!(created = created.len(), "Initialized default categories");
        Ok(created)
    }

    pub async fn create_category(
        &self,
        actor: Option<&Actor>,
        name: &str,
        unit_price: Naira,
        now: DateTime<Utc>,
    ) -> Result<Category> {
        self.access.require_staff(actor).await?;
        let name = format_name(name);
        if name.is_empty() {
            return Err(Error::Validation("category name is required".into()));
        }
        if unit_price < 0 {
            return Err(Error::Validation("unit price cannot be negative".into()));
        }
        self.store
            .transaction(|db| {
                if db.category_named(&name).is_some() {
                    return Err(Error::Conflict(format!("category '{name}' already exists")));
                }
                let category = Category::new(name, unit_price, now);
                db.categories.insert(category.id.clone(), category.clone());
                Ok(category)
            })
            .await
    }

    /// Sets the unit price and adds `quantity` head to stock.
    pub async fn restock(
        &self,
        actor: Option<&Actor>,
        name: &str,
        unit_price: Naira,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<Category> {
        self.access.require_staff(actor).await?;
        if unit_price < 0 || quantity < 0 {
            return Err(Error::Validation("price and quantity must not be negative".into()));
        }
        let category = self
            .store
            .transaction(|db| {
                let category = db
                    .category_named_mut(name)
                    .ok_or_else(|| Error::UnknownCategory(name.to_string()))?;
                let next = category.stock_qty.checked_add(quantity).ok_or_else(|| {
                    Error::Validation(format!("stock for {} is out of range", category.name))
                })?;
                category.unit_price = unit_price;
                category.stock_qty = next;
                category.updated_at = now;
                Ok(category.clone())
            })
            .await?;
        info!(category = %category.name, added = quantity, stock = category.stock_qty, "Restocked");
        Ok(category)
    }

    pub async fn adjust(
        &self,
        actor: Option<&Actor>,
        id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Category> {
        self.access.require_staff(actor).await?;
        self.store
            .transaction(|db| {
                let category = db.category_mut(id)?;
                let next = category.stock_qty.checked_add(delta).ok_or_else(|| {
                    Error::Validation(format!("stock for {} is out of range", category.name))
                })?;
                if next < 0 {
                    return Err(Error::Validation(format!(
                        "stock for {} cannot go below zero",
                        category.name
                    )));
                }
                category.stock_qty = next;
                category.updated_at = now;
                Ok(category.clone())
            })
            .await
    }

    pub async fn delete_category(&self, actor: Option<&Actor>, id: &str) -> Result<Category> {
        self.access.require_staff(actor).await?;
        let removed = self
            .store
            .transaction(|db| {
                db.categories
                    .remove(id)
                    .ok_or_else(|| Error::not_found("category", id))
            })
            .await?;
        if !removed.listing_ids.is_empty() {
            warn!(
                category = %removed.name,
                listings = removed.listing_ids.len(),
                "Deleted category still referenced by listings"
            );
        }
        Ok(removed)
    }

    /// In-store sale: stock, delivered order and revenue in one commit.
    pub async fn walk_in_sale(
        &self,
        actor: Option<&Actor>,
        sale: WalkInSale,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        self.access.require_staff(actor).await?;
        if sale.quantity == 0 {
            return Err(Error::Validation("quantity must be at least 1".into()));
        }
        if sale.customer_name.trim().is_empty() {
            return Err(Error::Validation("customer name is required".into()));
        }
        let offset = self.offset;

        let order = self
            .store
            .transaction(|db| {
                let category = db
                    .category_named_mut(&sale.category)
                    .ok_or_else(|| Error::UnknownCategory(sale.category.clone()))?;
                if category.stock_qty < i64::from(sale.quantity) {
                    return Err(Error::InsufficientStock {
                        category: category.name.clone(),
                        requested: sale.quantity,
                        available: category.stock_qty,
                    });
                }
                let total_amount = line_total(category.unit_price, sale.quantity)?;
                category.stock_qty -= i64::from(sale.quantity);
                category.updated_at = now;

                let order = Order {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: None,
                    customer_name: sale.customer_name.trim().to_string(),
                    phone: sale.phone.trim().to_string(),
                    email: String::new(),
                    address: WALK_IN_ADDRESS.to_string(),
                    order_details: category.name.clone(),
                    category: category.name.clone(),
                    quantity: sale.quantity,
                    unit_price: category.unit_price,
                    total_amount,
                    weight_per_unit: None,
                    status: OrderStatus::Delivered,
                    channel: OrderChannel::WalkIn,
                    created_at: now,
                    updated_at: now,
                    delivered_at: Some(now),
                };
                db.revenue.record(order.total_amount, now, offset)?;
                db.orders.insert(order.id.clone(), order.clone());
                Ok(order)
            })
            .await?;

        info!(
            order_id = %order.id,
            category = %order.category,
            quantity = order.quantity,
            total = order.total_amount,
            "Walk-in sale recorded"
        );
        Ok(order)
    }
}
