use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use livestock_store::config::BusinessConfig;
use livestock_store::models::{ListingDraft, NewsFeed, OrderStatus};
use livestock_store::services::{Actor, FulfillmentOutcome, NewOrder, NewsSource, Services, WalkInSale};
use livestock_store::storage::{Collection, MemoryObjectStore, MemoryStore, SalesLedger};
use livestock_store::{Error, Result};

struct NoNews;

#[async_trait]
impl NewsSource for NoNews {
    async fn fetch(&self) -> Result<NewsFeed> {
        Err(Error::Upstream("offline".into()))
    }
}

fn owner() -> Actor {
    Actor::new("ceo", Some("ceo@farm.ng"), "password")
}

fn customer() -> Actor {
    Actor::new("cust", Some("ada@mail.ng"), "google.com")
}

fn services(store: Arc<MemoryStore>, objects: Arc<MemoryObjectStore>) -> Services {
    let business = BusinessConfig {
        owner_uid: "ceo".into(),
        ..BusinessConfig::default()
    };
    Services::new(store, objects, Arc::new(NoNews), 3600, &business)
}

#[tokio::test]
async fn storefront_order_to_sales_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::open(dir.path().join("store.json")).await.unwrap());
    let objects = Arc::new(MemoryObjectStore::new("http://cdn.local/livestock"));
    let app = services(store.clone(), objects.clone());
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();

    app.content
        .update_contact(
            Some(&owner()),
            livestock_store::models::ContactUpdate {
                phone_number: Some("08030000000".into()),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    app.inventory.initialize_defaults(Some(&owner()), now).await.unwrap();
    app.inventory.restock(Some(&owner()), "Chicken", 7_500, 5, now).await.unwrap();

    let listing = app
        .catalog
        .save_listing(
            Some(&owner()),
            ListingDraft {
                breed: "Broiler".into(),
                category: "Chicken".into(),
                price: 7_500,
                specs: "2kg, free range".into(),
                image_url: "http://cdn.local/livestock/livestock/1_broiler.jpg".into(),
                ..Default::default()
            },
            None,
            now,
        )
        .await
        .unwrap();
    assert_eq!(listing.order_details(), "Broiler (2kg, free range)");

    let mut changes = store.subscribe();
    let placed = app
        .orders
        .place_order(
            Some(&customer()),
            NewOrder {
                listing_id: Some(listing.id.clone()),
                customer_name: "Ada".into(),
                phone: "08031234567".into(),
                address: "4 Marina".into(),
                quantity: 3,
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(app.inventory.stock_for("Chicken").await.unwrap().available, 2);

    let mut seen = Vec::new();
    while let Ok(change) = changes.try_recv() {
        seen.push(change.collection);
    }
    assert!(seen.contains(&Collection::Orders));
    assert!(seen.contains(&Collection::Categories));

    let delivered = app
        .orders
        .mark_delivered(Some(&owner()), &placed.order.id, now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(delivered.outcome, FulfillmentOutcome::Delivered);
    assert_eq!(app.inventory.stock_for("Chicken").await.unwrap().available, 2);

    let walk_in = app
        .inventory
        .walk_in_sale(
            Some(&owner()),
            WalkInSale {
                customer_name: "Tunde".into(),
                phone: "08039999999".into(),
                category: "chicken".into(),
                quantity: 2,
            },
            now + Duration::hours(2),
        )
        .await
        .unwrap();
    assert_eq!(walk_in.total_amount, 15_000);

    let revenue = app.revenue.snapshot(Some(&owner()), now + Duration::hours(3)).await.unwrap();
    assert_eq!(revenue.daily, 37_500);

    // Totals survive a restart.
    drop(app);
    let reopened = MemoryStore::open(dir.path().join("store.json")).await.unwrap();
    let orders = reopened.read(|db| db.orders.values().cloned().collect::<Vec<_>>()).await;
    assert_eq!(orders.len(), 2);
    assert_eq!(reopened.read(|db| db.revenue.yearly).await, 37_500);

    let key = SalesLedger::export(&orders, objects.as_ref(), now).await.unwrap();
    assert!(objects.contains(&key).await);
}

#[tokio::test]
async fn next_day_rollover_applies_before_new_revenue() {
    let store = Arc::new(MemoryStore::new());
    let app = services(store.clone(), Arc::new(MemoryObjectStore::new("http://cdn.local")));
    let monday = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();

    app.inventory.create_category(Some(&owner()), "Goat", 0, monday).await.unwrap();
    app.inventory.restock(Some(&owner()), "Goat", 80_000, 3, monday).await.unwrap();
    let sale = WalkInSale {
        customer_name: "Bisi".into(),
        phone: String::new(),
        category: "Goat".into(),
        quantity: 1,
    };
    app.inventory.walk_in_sale(Some(&owner()), sale.clone(), monday).await.unwrap();
    app.inventory
        .walk_in_sale(Some(&owner()), sale, monday + Duration::days(1))
        .await
        .unwrap();

    let totals = app.revenue.snapshot(Some(&owner()), monday + Duration::days(1)).await.unwrap();
    assert_eq!((totals.daily, totals.weekly), (80_000, 160_000));
}
