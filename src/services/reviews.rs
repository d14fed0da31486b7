use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::Review;
use crate::services::access::{require_signed_in, AccessControl, AccessLevel, Actor};
use crate::storage::MemoryStore;

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<MemoryStore>,
    access: AccessControl,
}

impl ReviewService {
    pub fn new(store: Arc<MemoryStore>, access: AccessControl) -> Self {
        Self { store, access }
    }

    /// One review per signed-in customer.
    pub async fn submit(
        &self,
        actor: Option<&Actor>,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<Review> {
        let actor = require_signed_in(actor)?;
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation(format!("rating must be between 1 and 5, got {rating}")));
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(Error::Validation("comment is required".into()));
        }

        let user_name = actor
            .display_name
            .clone()
            .or_else(|| actor.email.as_deref().and_then(|e| e.split('@').next()).map(str::to_string))
            .unwrap_or_else(|| "Customer".to_string());

        let review = self
            .store
            .transaction(|db| {
                if db.reviews.values().any(|r| r.user_id == actor.uid) {
                    return Err(Error::Conflict("you have already shared your feedback".into()));
                }
                let review = Review {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: actor.uid.clone(),
                    user_name,
                    rating,
                    comment: comment.to_string(),
                    verified: true,
                    date: now,
                };
                db.reviews.insert(review.id.clone(), review.clone());
                Ok(review)
            })
            .await?;

        info!(review_id = %review.id, rating, "Review submitted");
        Ok(review)
    }

    /// Authors may delete their own review; staff may delete any.
    pub async fn delete(&self, actor: Option<&Actor>, id: &str) -> Result<Review> {
        let signed_in = require_signed_in(actor)?;
        let moderator = self.access.level(actor).await >= AccessLevel::Staff;
        self.store
            .transaction(|db| {
                let review = db.reviews.get(id).ok_or_else(|| Error::not_found("review", id))?;
                if !moderator && review.user_id != signed_in.uid {
                    return Err(Error::Forbidden("only the author can delete this review".into()));
                }
                db.reviews
                    .remove(id)
                    .ok_or_else(|| Error::not_found("review", id))
            })
            .await
    }

    pub async fn list(&self) -> Vec<Review> {
        let mut reviews: Vec<Review> = self.store.read(|db| db.reviews.values().cloned().collect()).await;
        reviews.sort_by(|a, b| b.date.cmp(&a.date));
        reviews
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> ReviewService {
        let store = Arc::new(MemoryStore::new());
        let access = AccessControl::new(store.clone(), "ceo");
        ReviewService::new(store, access)
    }

    #[tokio::test]
    async fn one_review_per_user() {
        let reviews = service();
        let ada = Actor::new("ada", Some("ada@mail.ng"), "google.com");
        let first = reviews.submit(Some(&ada), 5, "Great goats", Utc::now()).await.unwrap();
        assert!(first.verified);
        assert_eq!(first.user_name, "ada");
        assert!(matches!(
            reviews.submit(Some(&ada), 4, "Again", Utc::now()).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn rating_and_comment_are_validated() {
        let reviews = service();
        let ada = Actor::new("ada", None, "google.com").with_display_name("Ada O.");
        assert!(reviews.submit(Some(&ada), 0, "x", Utc::now()).await.is_err());
        assert!(reviews.submit(Some(&ada), 6, "x", Utc::now()).await.is_err());
        assert!(reviews.submit(Some(&ada), 3, "   ", Utc::now()).await.is_err());
        assert!(reviews.submit(None, 3, "ok", Utc::now()).await.is_err());
        assert_eq!(reviews.submit(Some(&ada), 3, "ok", Utc::now()).await.unwrap().user_name, "Ada O.");
    }

    #[tokio::test]
    async fn only_author_or_staff_deletes() {
        let reviews = service();
        let ada = Actor::new("ada", None, "google.com");
        let bayo = Actor::new("bayo", None, "google.com");
        let owner = Actor::new("ceo", None, "password");
        let t0 = Utc::now();
        let a = reviews.submit(Some(&ada), 5, "Good", t0).await.unwrap();
        let b = reviews.submit(Some(&bayo), 2, "Late", t0 + Duration::minutes(1)).await.unwrap();
        assert_eq!(reviews.list().await[0].id, b.id);

        assert!(matches!(reviews.delete(Some(&bayo), &a.id).await, Err(Error::Forbidden(_))));
        reviews.delete(Some(&ada), &a.id).await.unwrap();
        reviews.delete(Some(&owner), &b.id).await.unwrap();
        assert!(reviews.list().await.is_empty());
    }
}
