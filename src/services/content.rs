//! Singleton page documents edited from the back-office.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{
    AboutContent, ContactSettings, ContactUpdate, HomepageContent, LegalContent,
    LivestockPageHeader,
};
use crate::services::access::{AccessControl, Actor};
use crate::storage::MemoryStore;

#[derive(Clone)]
pub struct ContentService {
    store: Arc<MemoryStore>,
    access: AccessControl,
}

impl ContentService {
    pub fn new(store: Arc<MemoryStore>, access: AccessControl) -> Self {
        Self { store, access }
    }

    pub async fn homepage(&self) -> HomepageContent {
        self.store.read(|db| db.homepage.clone()).await
    }

    pub async fn save_homepage(&self, actor: Option<&Actor>, content: HomepageContent) -> Result<HomepageContent> {
        self.access.require_staff(actor).await?;
        if content.rotating_texts.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::Validation("at least one rotating text is required".into()));
        }
        let saved = self
            .store
            .transaction(|db| {
                db.homepage = content;
                Ok(db.homepage.clone())
            })
            .await?;
        info!("Homepage content saved");
        Ok(saved)
    }

    pub async fn about(&self) -> AboutContent {
        self.store.read(|db| db.about.clone()).await
    }

    pub async fn save_about(&self, actor: Option<&Actor>, content: AboutContent) -> Result<AboutContent> {
        self.access.require_owner(actor).await?;
        let saved = self
            .store
            .transaction(|db| {
                db.about = content;
                Ok(db.about.clone())
            })
            .await?;
        info!("About page saved");
        Ok(saved)
    }

    pub async fn livestock_header(&self) -> LivestockPageHeader {
        self.store.read(|db| db.livestock_page.clone()).await
    }

    pub async fn save_livestock_header(
        &self,
        actor: Option<&Actor>,
        header: LivestockPageHeader,
    ) -> Result<LivestockPageHeader> {
        self.access.require_staff(actor).await?;
        self.store
            .transaction(|db| {
                db.livestock_page = header;
                Ok(db.livestock_page.clone())
            })
            .await
    }

    pub async fn legal(&self) -> LegalContent {
        self.store.read(|db| db.legal.clone()).await
    }

    pub async fn update_terms(&self, actor: Option<&Actor>, terms: String, now: DateTime<Utc>) -> Result<LegalContent> {
        self.update_legal(actor, now, |legal| legal.terms = terms).await
    }

    pub async fn update_privacy(&self, actor: Option<&Actor>, privacy: String, now: DateTime<Utc>) -> Result<LegalContent> {
        self.update_legal(actor, now, |legal| legal.privacy = privacy).await
    }

    async fn update_legal(
        &self,
        actor: Option<&Actor>,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut LegalContent),
    ) -> Result<LegalContent> {
        self.access.require_owner(actor).await?;
        let legal = self
            .store
            .transaction(|db| {
                edit(&mut db.legal);
                db.legal.updated_at = Some(now);
                Ok(db.legal.clone())
            })
            .await?;
        info!("Legal text updated");
        Ok(legal)
    }

    pub async fn contact(&self) -> ContactSettings {
        self.store.read(|db| db.contact.clone()).await
    }

    /// Only fields present in `update` change.
    pub async fn update_contact(
        &self,
        actor: Option<&Actor>,
        update: ContactUpdate,
        now: DateTime<Utc>,
    ) -> Result<ContactSettings> {
        self.access.require_staff(actor).await?;
        let contact = self
            .store
            .transaction(|db| {
                let c = &mut db.contact;
                let fields = [
                    (&mut c.phone_number, update.phone_number),
                    (&mut c.public_display_phone, update.public_display_phone),
                    (&mut c.email, update.email),
                    (&mut c.address, update.address),
                    (&mut c.boiler_message, update.boiler_message),
                    (&mut c.facebook, update.facebook),
                    (&mut c.instagram, update.instagram),
                    (&mut c.twitter, update.twitter),
                    (&mut c.youtube, update.youtube),
                    (&mut c.tiktok, update.tiktok),
                ];
                for (field, value) in fields {
                    if let Some(value) = value {
                        *field = value.trim().to_string();
                    }
                }
                c.updated_at = Some(now);
                Ok(c.clone())
            })
            .await?;
        info!(phone = %contact.phone_number, "Contact settings updated");
        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, StaffMember};

    async fn setup() -> ContentService {
        let store = Arc::new(MemoryStore::new());
        store
            .transaction(|db| {
                db.staff.insert(
                    "s1".into(),
                    StaffMember {
                        uid: "s1".into(),
                        name: "Femi".into(),
                        email: "femi@farm.ng".into(),
                        role: Role::Admin,
                        added_at: Utc::now(),
                    },
                );
                Ok(())
            })
            .await
            .unwrap();
        let access = AccessControl::new(store.clone(), "ceo");
        ContentService::new(store, access)
    }

    fn owner() -> Actor {
        Actor::new("ceo", None, "google.com")
    }

    fn staff() -> Actor {
        Actor::new("s1", Some("femi@farm.ng"), "password")
    }

    #[tokio::test]
    async fn defaults_are_served_before_any_save() {
        let content = setup().await;
        assert_eq!(content.homepage().await.main_title, "FarmFresh");
        assert_eq!(content.contact().await.email, "sales@farmlivestock.com");
        assert_eq!(content.about().await.milestones.len(), 4);
    }

    #[tokio::test]
    async fn contact_update_merges() {
        let content = setup().await;
        let now = Utc::now();
        content
            .update_contact(Some(&staff()), ContactUpdate { phone_number: Some(" 0803 ".into()), ..Default::default() }, now)
            .await
            .unwrap();
        let c = content
            .update_contact(Some(&staff()), ContactUpdate { instagram: Some("@farm".into()), ..Default::default() }, now)
            .await
            .unwrap();
        assert_eq!(c.phone_number, "0803");
        assert_eq!(c.instagram, "@farm");
        assert_eq!(c.email, "sales@farmlivestock.com");
    }

    #[tokio::test]
    async fn legal_edits_keep_the_other_document() {
        let content = setup().await;
        let now = Utc::now();
        content.update_terms(Some(&owner()), "Terms v1".into(), now).await.unwrap();
        let legal = content.update_privacy(Some(&owner()), "Privacy v1".into(), now).await.unwrap();
        assert_eq!(legal.terms, "Terms v1");
        assert_eq!(legal.privacy, "Privacy v1");
        assert!(content.update_terms(Some(&staff()), "x".into(), now).await.is_err());
    }

    #[tokio::test]
    async fn homepage_needs_rotating_text() {
        let content = setup().await;
        let mut page = content.homepage().await;
        page.rotating_texts = vec![" ".into()];
        assert!(matches!(
            content.save_homepage(Some(&staff()), page).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn about_page_is_owner_only() {
        let content = setup().await;
        let mut about = content.about().await;
        about.ceo_name = "Mrs Okafor".into();
        assert!(content.save_about(Some(&staff()), about.clone()).await.is_err());
        let saved = content.save_about(Some(&owner()), about).await.unwrap();
        assert_eq!(saved.ceo_name, "Mrs Okafor");
    }
}
