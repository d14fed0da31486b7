use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{BusinessConfig, DEFAULT_RECEIPT_VALIDITY_HOURS};
use crate::error::{Error, Result};
use crate::models::{Naira, Order, OrderChannel, OrderStatus};
use crate::services::access::{require_signed_in, AccessControl, Actor};
use crate::services::inventory::{derive_category, line_total};
use crate::services::notify;
use crate::storage::MemoryStore;

/// Storefront order form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Listing the customer ordered from; its price and details win over the free-text fields.
    #[serde(default)]
    pub listing_id: Option<String>,
    #[serde(default)]
    pub order_details: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub address: String,
    pub quantity: u32,
    #[serde(default)]
    pub weight_per_unit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    /// Pre-filled message to the business WhatsApp line.
    pub enquiry_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FulfillmentOutcome {
    Delivered,
    AlreadyDelivered,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    pub outcome: FulfillmentOutcome,
    pub order: Order,
    /// `None` when the customer phone has no dialable digits.
    pub notification_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub short_id: String,
    pub order: Order,
    pub weight_per_unit: f64,
    /// Total divided by quantity and, when known, by live weight.
    pub unit_price_per_kg: f64,
    pub valid_until: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<MemoryStore>,
    access: AccessControl,
    offset: FixedOffset,
    receipt_base_url: String,
    receipt_validity: Duration,
}

impl OrderService {
    pub fn new(store: Arc<MemoryStore>, access: AccessControl, business: &BusinessConfig) -> Self {
        Self {
            store,
            access,
            offset: business.offset(),
            receipt_base_url: business.receipt_base_url.trim_end_matches('/').to_string(),
            receipt_validity: Duration::try_hours(business.receipt_validity_hours)
                .unwrap_or(Duration::hours(DEFAULT_RECEIPT_VALIDITY_HOURS)),
        }
    }

    pub fn receipt_url(&self, id: &str) -> String {
        format!("{}/{}", self.receipt_base_url, id)
    }

    /// Reserves stock and records a pending order in one commit.
    pub async fn place_order(
        &self,
        actor: Option<&Actor>,
        form: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<PlacedOrder> {
        let actor = require_signed_in(actor)?;
        validate(&form)?;

        let order = self
            .store
            .transaction(|db| {
                if db.contact.phone_number.trim().is_empty() {
                    return Err(Error::Validation("business WhatsApp number is not configured".into()));
                }

                let listing = match form.listing_id.as_deref() {
                    Some(id) => Some(
                        db.listings
                            .get(id)
                            .cloned()
                            .ok_or_else(|| Error::not_found("listing", id))?,
                    ),
                    None => None,
                };

                let details = listing
                    .as_ref()
                    .map(|l| l.order_details())
                    .or_else(|| form.order_details.clone())
                    .unwrap_or_default();
                let wanted = listing
                    .as_ref()
                    .map(|l| l.category.clone())
                    .or_else(|| form.category.clone())
                    .unwrap_or_else(|| derive_category(&details));
                if wanted.trim().is_empty() {
                    return Err(Error::Validation("order does not name a category".into()));
                }

                let category = db
                    .category_named_mut(&wanted)
                    .ok_or_else(|| Error::UnknownCategory(wanted.clone()))?;
                if category.stock_qty < i64::from(form.quantity) {
                    return Err(Error::InsufficientStock {
                        category: category.name.clone(),
                        requested: form.quantity,
                        available: category.stock_qty,
                    });
                }
                let unit_price: Naira = listing.as_ref().map_or(category.unit_price, |l| l.price);
                let total_amount = line_total(unit_price, form.quantity)?;
                category.stock_qty -= i64::from(form.quantity);
                category.updated_at = now;

                let order = Order {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: Some(actor.uid.clone()),
                    customer_name: form.customer_name.trim().to_string(),
                    phone: form.phone.trim().to_string(),
                    email: form.email.trim().to_string(),
                    address: form.address.trim().to_string(),
                    order_details: if details.is_empty() { category.name.clone() } else { details },
                    category: category.name.clone(),
                    quantity: form.quantity,
                    unit_price,
                    total_amount,
                    weight_per_unit: form.weight_per_unit.filter(|w| *w > 0.0),
                    status: OrderStatus::Pending,
                    channel: OrderChannel::Online,
                    created_at: now,
                    updated_at: now,
                    delivered_at: None,
                };
                db.orders.insert(order.id.clone(), order.clone());
                Ok(order)
            })
            .await?;

        info!(
            order_id = %order.id,
            category = %order.category,
            quantity = order.quantity,
            total = order.total_amount,
            "Order placed"
        );

        let enquiry_link = self.enquiry_link(&order).await?;
        Ok(PlacedOrder { order, enquiry_link })
    }

    pub async fn enquiry_link(&self, order: &Order) -> Result<String> {
        let business_phone = self.store.read(|db| db.contact.phone_number.clone()).await;
        notify::deep_link(&business_phone, &notify::enquiry_message(order))
            .ok_or_else(|| Error::Validation("business WhatsApp number is not configured".into()))
    }

    /// Marks the order delivered and books its revenue. Repeating the call is harmless.
    pub async fn mark_delivered(
        &self,
        actor: Option<&Actor>,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Fulfillment> {
        self.access.require_staff(actor).await?;
        let offset = self.offset;

        let (outcome, order) = self
            .store
            .transaction(|db| {
                let order = db.order_mut(id)?;
                if order.status == OrderStatus::Delivered {
                    return Ok((FulfillmentOutcome::AlreadyDelivered, order.clone()));
                }
                order.status = OrderStatus::Delivered;
                order.delivered_at = Some(now);
                order.updated_at = now;
                let order = order.clone();
                db.revenue.record(order.total_amount, now, offset)?;
                Ok((FulfillmentOutcome::Delivered, order))
            })
            .await?;

        match outcome {
            FulfillmentOutcome::Delivered => info!(
                order_id = %order.id,
                total = order.total_amount,
                "Order delivered"
            ),
            FulfillmentOutcome::AlreadyDelivered => {
                debug!(order_id = %order.id, "Order was already delivered")
            }
        }

        let message = notify::delivery_message(
            &order,
            &self.receipt_url(&order.id),
            self.receipt_validity.num_hours(),
        );
        let notification_link = notify::deep_link(&order.phone, &message);
        Ok(Fulfillment { outcome, order, notification_link })
    }

    /// Pending orders hand their reservation back to stock. Revenue is never reversed.
    pub async fn delete_order(&self, actor: Option<&Actor>, id: &str, now: DateTime<Utc>) -> Result<Order> {
        self.access.require_staff(actor).await?;
        let removed = self
            .store
            .transaction(|db| {
                let order = db
                    .orders
                    .remove(id)
                    .ok_or_else(|| Error::not_found("order", id))?;
                if order.is_pending() {
                    if let Some(category) = db.category_named_mut(&order.category) {
                        category.stock_qty += i64::from(order.quantity);
                        category.updated_at = now;
                    }
                }
                Ok(order)
            })
            .await?;

        info!(
            order_id = %removed.id,
            restocked = removed.is_pending(),
            "Order deleted"
        );
        Ok(removed)
    }

    /// Pending first, newest first within each group.
    pub async fn list(&self, actor: Option<&Actor>) -> Result<Vec<Order>> {
        self.access.require_staff(actor).await?;
        let mut orders: Vec<Order> = self.store.read(|db| db.orders.values().cloned().collect()).await;
        orders.sort_by(|a, b| {
            b.is_pending()
                .cmp(&a.is_pending())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(orders)
    }

    /// Public receipt for a delivered order, available for a limited time after delivery.
    pub async fn receipt(&self, id: &str, now: DateTime<Utc>) -> Result<Receipt> {
        let order = self
            .store
            .read(|db| db.orders.get(id).cloned())
            .await
            .ok_or_else(|| Error::not_found("receipt", id))?;

        let Some(delivered_at) = order.delivered_at.filter(|_| order.status == OrderStatus::Delivered) else {
            return Err(Error::not_found("receipt", id));
        };
        let valid_until = delivered_at + self.receipt_validity;
        if now > valid_until {
            debug!(order_id = %id, "Receipt expired");
            return Err(Error::not_found("receipt", id));
        }

        let weight = order.weight_per_unit.unwrap_or(0.0);
        let divisor = f64::from(order.quantity.max(1)) * if weight > 0.0 { weight } else { 1.0 };
        Ok(Receipt {
            short_id: order.short_id(),
            unit_price_per_kg: order.total_amount as f64 / divisor,
            weight_per_unit: weight,
            valid_until,
            order,
        })
    }
}

fn validate(form: &NewOrder) -> Result<()> {
    if form.quantity == 0 {
        return Err(Error::Validation("quantity must be at least 1".into()));
    }
    for (field, value) in [
        ("name", &form.customer_name),
        ("phone", &form.phone),
        ("address", &form.address),
    ] {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{field} is required")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    const OWNER: &str = "ceo";

    fn owner() -> Actor {
        Actor::new(OWNER, Some("ceo@farm.ng"), "password")
    }

    fn customer() -> Actor {
        Actor::new("cust-1", Some("ada@mail.ng"), "google.com")
    }

    async fn seeded(stock: i64) -> (Arc<MemoryStore>, OrderService) {
        let store = Arc::new(MemoryStore::new());
        store
            .transaction(|db| {
                let mut chicken = Category::new("Broiler", 7_500, Utc::now());
                chicken.stock_qty = stock;
                db.categories.insert(chicken.id.clone(), chicken);
                db.contact.phone_number = "08030000000".into();
                Ok(())
            })
            .await
            .unwrap();
        let access = AccessControl::new(store.clone(), OWNER);
        let service = OrderService::new(store.clone(), access, &BusinessConfig::default());
        (store, service)
    }

    fn form(quantity: u32) -> NewOrder {
        NewOrder {
            order_details: Some("Broiler (2kg, free range)".into()),
            customer_name: "Ada".into(),
            phone: "08031234567".into(),
            email: "ada@mail.ng".into(),
            address: "4 Marina, Lagos".into(),
            quantity,
            ..NewOrder::default()
        }
    }

    async fn stock(store: &MemoryStore) -> i64 {
        store.read(|db| db.category_named("broiler").unwrap().stock_qty).await
    }

    #[tokio::test]
    async fn placing_reserves_stock_and_delivery_does_not_deduct_again() {
        let (store, service) = seeded(5).await;
        let now = Utc::now();
        let placed = service.place_order(Some(&customer()), form(3), now).await.unwrap();
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_amount, 22_500);
        assert!(placed.enquiry_link.starts_with("https://wa.me/2348030000000?text="));
        assert_eq!(stock(&store).await, 2);

        let done = service.mark_delivered(Some(&owner()), &placed.order.id, now).await.unwrap();
        assert_eq!(done.outcome, FulfillmentOutcome::Delivered);
        assert!(done.notification_link.unwrap().starts_with("https://wa.me/2348031234567"));
        assert_eq!(stock(&store).await, 2);
        assert_eq!(store.read(|db| db.revenue.daily).await, 22_500);
    }

    #[tokio::test]
    async fn repeated_delivery_is_a_no_op() {
        let (store, service) = seeded(5).await;
        let now = Utc::now();
        let placed = service.place_order(Some(&customer()), form(1), now).await.unwrap();
        service.mark_delivered(Some(&owner()), &placed.order.id, now).await.unwrap();
        let again = service.mark_delivered(Some(&owner()), &placed.order.id, now).await.unwrap();
        assert_eq!(again.outcome, FulfillmentOutcome::AlreadyDelivered);
        assert_eq!(store.read(|db| db.revenue.weekly).await, 7_500);
        assert_eq!(stock(&store).await, 4);
    }

    #[tokio::test]
    async fn overselling_is_rejected_atomically() {
        let (store, service) = seeded(2).await;
        let err = service.place_order(Some(&customer()), form(3), Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientStock { requested: 3, available: 2, .. }));
        assert_eq!(stock(&store).await, 2);
        assert!(store.read(|db| db.orders.is_empty()).await);
    }

    #[tokio::test]
    async fn concurrent_orders_for_last_unit_only_one_wins() {
        let (store, service) = seeded(1).await;
        let now = Utc::now();
        let a = customer();
        let b = Actor::new("cust-2", Some("bayo@mail.ng"), "google.com");
        let (first, second) = tokio::join!(
            service.place_order(Some(&a), form(1), now),
            service.place_order(Some(&b), form(1), now),
        );
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        assert_eq!(stock(&store).await, 0);
    }

    #[tokio::test]
    async fn anonymous_and_unconfigured_orders_are_refused() {
        let (store, service) = seeded(5).await;
        assert!(matches!(
            service.place_order(None, form(1), Utc::now()).await,
            Err(Error::Forbidden(_))
        ));
        store
            .transaction(|db| {
                db.contact.phone_number.clear();
                Ok(())
            })
            .await
            .unwrap();
        assert!(matches!(
            service.place_order(Some(&customer()), form(1), Utc::now()).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(stock(&store).await, 5);
    }

    #[tokio::test]
    async fn deleting_pending_order_restocks() {
        let (store, service) = seeded(5).await;
        let now = Utc::now();
        let pending = service.place_order(Some(&customer()), form(2), now).await.unwrap().order;
        let delivered = service.place_order(Some(&customer()), form(1), now).await.unwrap().order;
        service.mark_delivered(Some(&owner()), &delivered.id, now).await.unwrap();
        assert_eq!(stock(&store).await, 2);

        service.delete_order(Some(&owner()), &pending.id, now).await.unwrap();
        assert_eq!(stock(&store).await, 4);
        service.delete_order(Some(&owner()), &delivered.id, now).await.unwrap();
        assert_eq!(stock(&store).await, 4);
        assert_eq!(store.read(|db| db.revenue.daily).await, 7_500);
    }

    #[tokio::test]
    async fn list_puts_pending_first() {
        let (_, service) = seeded(10).await;
        let t0 = Utc::now();
        let old = service.place_order(Some(&customer()), form(1), t0).await.unwrap().order;
        let done = service
            .place_order(Some(&customer()), form(1), t0 + Duration::minutes(5))
            .await
            .unwrap()
            .order;
        service.mark_delivered(Some(&owner()), &done.id, t0).await.unwrap();
        let newest = service
            .place_order(Some(&customer()), form(1), t0 + Duration::minutes(10))
            .await
            .unwrap()
            .order;

        let ids: Vec<String> = service.list(Some(&owner())).await.unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newest.id, old.id, done.id]);
        assert!(service.list(Some(&customer())).await.is_err());
    }

    #[tokio::test]
    async fn receipt_expires_after_validity_window() {
        let (_, service) = seeded(5).await;
        let now = Utc::now();
        let mut f = form(2);
        f.weight_per_unit = Some(2.5);
        let order = service.place_order(Some(&customer()), f, now).await.unwrap().order;
        assert!(service.receipt(&order.id, now).await.is_err());

        service.mark_delivered(Some(&owner()), &order.id, now).await.unwrap();
        let receipt = service.receipt(&order.id, now + Duration::hours(47)).await.unwrap();
        assert_eq!(receipt.short_id, order.short_id());
        assert_eq!(receipt.unit_price_per_kg, 3_000.0);
        assert!(matches!(
            service.receipt(&order.id, now + Duration::hours(49)).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn total_out_of_range_is_rejected_without_touching_stock() {
        let (store, service) = seeded(5).await;
        store
            .transaction(|db| {
                db.category_named_mut("broiler").unwrap().unit_price = i64::MAX;
                Ok(())
            })
            .await
            .unwrap();
        let err = service.place_order(Some(&customer()), form(2), Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(stock(&store).await, 5);
        assert!(store.read(|db| db.orders.is_empty()).await);
    }

    #[test]
    fn oversized_receipt_validity_falls_back_to_default() {
        let store = Arc::new(MemoryStore::new());
        let access = AccessControl::new(store.clone(), OWNER);
        let business = BusinessConfig {
            receipt_validity_hours: i64::MAX,
            ..BusinessConfig::default()
        };
        let service = OrderService::new(store, access, &business);
        assert_eq!(service.receipt_validity.num_hours(), DEFAULT_RECEIPT_VALIDITY_HOURS);
    }
}
