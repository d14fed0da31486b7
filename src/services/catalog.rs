use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Category, Listing, ListingDraft};
use crate::services::access::{AccessControl, Actor};
use crate::services::inventory::format_name;
use crate::storage::{MemoryStore, ObjectStore};

const OTHER_CATEGORY: &str = "other";

/// Tailwind background class shown behind a listing card.
pub fn colour_for(category: &str) -> &'static str {
    match category.trim().to_lowercase().as_str() {
        "pig" => "bg-amber-600",
        "snail" => "bg-red-700",
        "goat" => "bg-gray-800",
        "chicken" => "bg-blue-800",
        "cow" => "bg-emerald-900",
        "fish" => "bg-green-500",
        _ => "bg-emerald-900",
    }
}

fn newest_first(a: &Listing, b: &Listing) -> std::cmp::Ordering {
    b.last_touched().cmp(&a.last_touched())
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<MemoryStore>,
    objects: Arc<dyn ObjectStore>,
    access: AccessControl,
    featured_limit: usize,
}

impl CatalogService {
    pub fn new(
        store: Arc<MemoryStore>,
        objects: Arc<dyn ObjectStore>,
        access: AccessControl,
        featured_limit: usize,
    ) -> Self {
        Self { store, objects, access, featured_limit }
    }

    pub async fn get(&self, id: &str) -> Result<Listing> {
        self.store
            .read(|db| db.listings.get(id).cloned())
            .await
            .ok_or_else(|| Error::not_found("listing", id))
    }

    /// Creates the listing, or updates it in place when `id` is given.
    pub async fn save_listing(
        &self,
        editor: Option<&Actor>,
        draft: ListingDraft,
        id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        self.access.require_staff(editor).await?;
        let editor_email = editor
            .and_then(|a| a.email.clone())
            .unwrap_or_default();

        if draft.image_url.trim().is_empty() {
            return Err(Error::Validation("an image is required".into()));
        }
        if draft.breed.trim().is_empty() {
            return Err(Error::Validation("breed is required".into()));
        }
        if draft.price < 0 {
            return Err(Error::Validation("price cannot be negative".into()));
        }

        let category_name = if draft.category.trim().eq_ignore_ascii_case(OTHER_CATEGORY) {
            let name = draft.new_category.as_deref().map(format_name).unwrap_or_default();
            if name.is_empty() {
                return Err(Error::Validation("new category name is required".into()));
            }
            name
        } else {
            draft.category.trim().to_string()
        };
        if category_name.is_empty() {
            return Err(Error::Validation("category is required".into()));
        }

        let listing = self
            .store
            .transaction(|db| {
                let category_id = match db.category_named(&category_name) {
                    Some(existing) => existing.id.clone(),
                    None => {
                        let created = Category::new(category_name.clone(), draft.price, now);
                        info!(category = %created.name, "Created category from listing form");
                        let created_id = created.id.clone();
                        db.categories.insert(created_id.clone(), created);
                        created_id
                    }
                };
                let canonical = db.categories[&category_id].name.clone();

                let listing = match id {
                    Some(id) => {
                        let previous = db.listing_mut(id)?.category.clone();
                        if !previous.eq_ignore_ascii_case(&canonical) {
                            if let Some(old) = db.category_named_mut(&previous) {
                                old.listing_ids.retain(|l| l != id);
                            }
                        }
                        let listing = db.listing_mut(id)?;
                        listing.breed = draft.breed.trim().to_string();
                        listing.category = canonical.clone();
                        listing.price = draft.price;
                        listing.description = draft.description.clone();
                        listing.specs = draft.specs.trim().to_string();
                        listing.image_url = draft.image_url.clone();
                        listing.color = colour_for(&canonical).to_string();
                        listing.updated_at = now;
                        listing.added_by = editor_email.clone();
                        listing.clone()
                    }
                    None => {
                        let listing = Listing {
                            id: uuid::Uuid::new_v4().to_string(),
                            breed: draft.breed.trim().to_string(),
                            category: canonical.clone(),
                            price: draft.price,
                            description: draft.description.clone(),
                            specs: draft.specs.trim().to_string(),
                            image_url: draft.image_url.clone(),
                            color: colour_for(&canonical).to_string(),
                            features: Vec::new(),
                            featured: false,
                            created_at: now,
                            updated_at: now,
                            added_by: editor_email.clone(),
                        };
                        db.listings.insert(listing.id.clone(), listing.clone());
                        listing
                    }
                };

                let category = db.category_mut(&category_id)?;
                if !category.listing_ids.contains(&listing.id) {
                    category.listing_ids.push(listing.id.clone());
                    category.updated_at = now;
                }
                Ok(listing)
            })
            .await?;

        info!(listing_id = %listing.id, breed = %listing.breed, category = %listing.category, "Listing saved");
        Ok(listing)
    }

    /// Removes the listing; its stored image is cleaned up best-effort afterwards.
    pub async fn delete_listing(&self, actor: Option<&Actor>, id: &str) -> Result<Listing> {
        self.access.require_staff(actor).await?;
        let removed = self
            .store
            .transaction(|db| {
                let listing = db
                    .listings
                    .remove(id)
                    .ok_or_else(|| Error::not_found("listing", id))?;
                if let Some(category) = db.category_named_mut(&listing.category) {
                    category.listing_ids.retain(|l| l != id);
                }
                Ok(listing)
            })
            .await?;

        match self.objects.key_from_url(&removed.image_url) {
            Some(key) => {
                if let Err(e) = self.objects.delete(&key).await {
                    warn!(error = %e, key = %key, "Failed to delete listing image");
                }
            }
            None => debug!(url = %removed.image_url, "Listing image is not in our bucket, leaving it"),
        }

        info!(listing_id = %removed.id, "Listing deleted");
        Ok(removed)
    }

    pub async fn toggle_featured(
        &self,
        actor: Option<&Actor>,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        self.access.require_staff(actor).await?;
        let limit = self.featured_limit;
        self.store
            .transaction(|db| {
                let currently = db.listings.values().filter(|l| l.featured).count();
                let listing = db.listing_mut(id)?;
                if !listing.featured && currently >= limit {
                    return Err(Error::Conflict(format!(
                        "at most {limit} listings can be featured"
                    )));
                }
                listing.featured = !listing.featured;
                listing.updated_at = now;
                Ok(listing.clone())
            })
            .await
    }

    pub async fn add_feature(
        &self,
        actor: Option<&Actor>,
        id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        self.access.require_staff(actor).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("feature text is required".into()));
        }
        self.store
            .transaction(|db| {
                let listing = db.listing_mut(id)?;
                listing.features.push(text.to_string());
                listing.updated_at = now;
                Ok(listing.clone())
            })
            .await
    }

    pub async fn remove_feature(
        &self,
        actor: Option<&Actor>,
        id: &str,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        self.access.require_staff(actor).await?;
        self.store
            .transaction(|db| {
                let listing = db.listing_mut(id)?;
                if index >= listing.features.len() {
                    return Err(Error::not_found("feature", index.to_string()));
                }
                listing.features.remove(index);
                listing.updated_at = now;
                Ok(listing.clone())
            })
            .await
    }

    /// Case-insensitive match on category, breed and specs. Newest first.
    pub async fn search(&self, query: &str) -> Vec<Listing> {
        let needle = query.trim().to_lowercase();
        let mut hits: Vec<Listing> = self
            .store
            .read(|db| {
                db.listings
                    .values()
                    .filter(|l| {
                        needle.is_empty()
                            || l.category.to_lowercase().contains(&needle)
                            || l.breed.to_lowercase().contains(&needle)
                            || l.specs.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            })
            .await;
        hits.sort_by(newest_first);
        hits
    }

    pub async fn featured(&self) -> Vec<Listing> {
        let mut featured: Vec<Listing> = self
            .store
            .read(|db| db.listings.values().filter(|l| l.featured).cloned().collect())
            .await;
        featured.sort_by(newest_first);
        featured.truncate(self.featured_limit);
        featured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::storage::MemoryObjectStore;

    const OWNER: &str = "ceo";

    fn owner() -> Actor {
        Actor::new(OWNER, Some("CEO@farm.ng"), "password")
    }

    fn draft(breed: &str, category: &str, image: &str) -> ListingDraft {
        ListingDraft {
            breed: breed.into(),
            category: category.into(),
            new_category: None,
            price: 50_000,
            description: "Healthy".into(),
            specs: "Large".into(),
            image_url: image.into(),
        }
    }

    fn service() -> (Arc<MemoryStore>, Arc<MemoryObjectStore>, CatalogService) {
        let store = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::new("http://cdn.local/bucket"));
        let access = AccessControl::new(store.clone(), OWNER);
        let catalog = CatalogService::new(store.clone(), objects.clone(), access, 3);
        (store, objects, catalog)
    }

    #[test]
    fn colours_follow_category() {
        assert_eq!(colour_for("Pig"), "bg-amber-600");
        assert_eq!(colour_for(" snail "), "bg-red-700");
        assert_eq!(colour_for("Turkey"), "bg-emerald-900");
    }

    #[tokio::test]
    async fn other_category_is_created_and_linked() {
        let (store, _, catalog) = service();
        let mut d = draft("West African Dwarf", "other", "http://img/x.jpg");
        d.new_category = Some("  sheep ".into());
        let listing = catalog.save_listing(Some(&owner()), d, None, Utc::now()).await.unwrap();

        assert_eq!(listing.category, "Sheep");
        assert_eq!(listing.added_by, "ceo@farm.ng");
        let linked = store
            .read(|db| db.category_named("sheep").map(|c| c.listing_ids.clone()))
            .await
            .unwrap();
        assert_eq!(linked, vec![listing.id]);
    }

    #[tokio::test]
    async fn image_is_required() {
        let (_, _, catalog) = service();
        let err = catalog
            .save_listing(Some(&owner()), draft("Boer", "Goat", " "), None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn moving_a_listing_relinks_categories() {
        let (store, _, catalog) = service();
        let now = Utc::now();
        let listing = catalog
            .save_listing(Some(&owner()), draft("Boer", "Goat", "http://img/a.jpg"), None, now)
            .await
            .unwrap();
        let moved = catalog
            .save_listing(Some(&owner()), draft("Boer", "Cow", "http://img/a.jpg"), Some(&listing.id), now)
            .await
            .unwrap();
        assert_eq!(moved.color, "bg-emerald-900");

        let (goat, cow) = store
            .read(|db| {
                (
                    db.category_named("Goat").unwrap().listing_ids.len(),
                    db.category_named("Cow").unwrap().listing_ids.len(),
                )
            })
            .await;
        assert_eq!((goat, cow), (0, 1));
    }

    #[tokio::test]
    async fn delete_cleans_up_owned_image_only() {
        let (_, objects, catalog) = service();
        let url = objects.put("livestock/1_goat.jpg", vec![0], "image/jpeg").await.unwrap();
        let now = Utc::now();

        let owned = catalog
            .save_listing(Some(&owner()), draft("Boer", "Goat", &url), None, now)
            .await
            .unwrap();
        let foreign = catalog
            .save_listing(Some(&owner()), draft("Kalahari", "Goat", "https://images.example/k.jpg"), None, now)
            .await
            .unwrap();

        catalog.delete_listing(Some(&owner()), &owned.id).await.unwrap();
        assert!(!objects.contains("livestock/1_goat.jpg").await);
        // Foreign URLs are left alone.
        catalog.delete_listing(Some(&owner()), &foreign.id).await.unwrap();
        assert!(catalog.search("").await.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_listing_unlinks_it_from_its_category() {
        let (store, _, catalog) = service();
        let now = Utc::now();
        let kept = catalog
            .save_listing(Some(&owner()), draft("Boer", "Goat", "http://img/a.jpg"), None, now)
            .await
            .unwrap();
        let gone = catalog
            .save_listing(Some(&owner()), draft("Kalahari", "Goat", "http://img/b.jpg"), None, now)
            .await
            .unwrap();

        catalog.delete_listing(Some(&owner()), &gone.id).await.unwrap();
        let linked = store
            .read(|db| db.category_named("goat").unwrap().listing_ids.clone())
            .await;
        assert_eq!(linked, vec![kept.id]);
        assert!(matches!(
            catalog.delete_listing(Some(&owner()), &gone.id).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn featured_is_capped() {
        let (_, _, catalog) = service();
        let now = Utc::now();
        let mut ids = Vec::new();
        for i in 0..4 {
            let l = catalog
                .save_listing(Some(&owner()), draft(&format!("Breed {i}"), "Pig", "http://img/p.jpg"), None, now)
                .await
                .unwrap();
            ids.push(l.id);
        }
        for id in &ids[..3] {
            catalog.toggle_featured(Some(&owner()), id, now).await.unwrap();
        }
        assert!(matches!(
            catalog.toggle_featured(Some(&owner()), &ids[3], now).await,
            Err(Error::Conflict(_))
        ));
        let off = catalog.toggle_featured(Some(&owner()), &ids[0], now).await.unwrap();
        assert!(!off.featured);
        assert_eq!(catalog.featured().await.len(), 2);
    }

    #[tokio::test]
    async fn search_matches_specs_and_orders_newest_first() {
        let (_, _, catalog) = service();
        let t0 = Utc::now();
        let mut old = draft("Large White", "Pig", "http://img/1.jpg");
        old.specs = "Free range".into();
        catalog.save_listing(Some(&owner()), old, None, t0).await.unwrap();
        catalog
            .save_listing(Some(&owner()), draft("Landrace", "Pig", "http://img/2.jpg"), None, t0 + Duration::hours(1))
            .await
            .unwrap();

        let hits = catalog.search("PIG").await;
        assert_eq!(hits[0].breed, "Landrace");
        assert_eq!(catalog.search("free RANGE").await.len(), 1);
        assert!(catalog.search("turkey").await.is_empty());
    }

    #[tokio::test]
    async fn features_can_be_added_and_removed() {
        let (_, _, catalog) = service();
        let now = Utc::now();
        let l = catalog
            .save_listing(Some(&owner()), draft("Boer", "Goat", "http://img/a.jpg"), None, now)
            .await
            .unwrap();
        catalog.add_feature(Some(&owner()), &l.id, "Vaccinated", now).await.unwrap();
        catalog.add_feature(Some(&owner()), &l.id, "Dewormed", now).await.unwrap();
        let l = catalog.remove_feature(Some(&owner()), &l.id, 0, now).await.unwrap();
        assert_eq!(l.features, vec!["Dewormed".to_string()]);
        assert!(catalog.remove_feature(Some(&owner()), &l.id, 5, now).await.is_err());
    }
}
