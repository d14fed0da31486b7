pub mod access;
pub mod catalog;
pub mod content;
pub mod inventory;
pub mod news;
pub mod notify;
pub mod orders;
pub mod revenue;
pub mod reviews;
pub mod staff;

use std::sync::Arc;

pub use access::{AccessControl, AccessLevel, Actor};
pub use catalog::CatalogService;
pub use content::ContentService;
pub use inventory::{InventoryService, StockLevel, WalkInSale};
pub use news::{NewsApiClient, NewsService, NewsSource};
pub use orders::{Fulfillment, FulfillmentOutcome, NewOrder, OrderService, PlacedOrder, Receipt};
pub use revenue::RevenueService;
pub use reviews::ReviewService;
pub use staff::StaffService;

use crate::config::BusinessConfig;
use crate::storage::{MemoryStore, ObjectStore};

/// Every service wired to one store, as handed to the HTTP layer.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<MemoryStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub access: AccessControl,
    pub inventory: InventoryService,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub revenue: RevenueService,
    pub staff: StaffService,
    pub content: ContentService,
    pub reviews: ReviewService,
    pub news: Arc<NewsService>,
}

impl Services {
    pub fn new(
        store: Arc<MemoryStore>,
        objects: Arc<dyn ObjectStore>,
        news_source: Arc<dyn NewsSource>,
        news_ttl_secs: u64,
        business: &BusinessConfig,
    ) -> Self {
        let offset = business.offset();
        let access = AccessControl::new(store.clone(), business.owner_uid.clone());
        Self {
            inventory: InventoryService::new(store.clone(), access.clone(), offset),
            catalog: CatalogService::new(
                store.clone(),
                objects.clone(),
                access.clone(),
                business.featured_limit,
            ),
            orders: OrderService::new(store.clone(), access.clone(), business),
            revenue: RevenueService::new(store.clone(), access.clone(), offset),
            staff: StaffService::new(store.clone(), access.clone()),
            content: ContentService::new(store.clone(), access.clone()),
            reviews: ReviewService::new(store.clone(), access.clone()),
            news: Arc::new(NewsService::new(news_source, news_ttl_secs)),
            access,
            objects,
            store,
        }
    }
}
