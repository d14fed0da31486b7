use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Role, StaffMember};
use crate::services::access::{AccessControl, Actor};
use crate::storage::MemoryStore;

#[derive(Clone)]
pub struct StaffService {
    store: Arc<MemoryStore>,
    access: AccessControl,
}

impl StaffService {
    pub fn new(store: Arc<MemoryStore>, access: AccessControl) -> Self {
        Self { store, access }
    }

    /// Registers an admin. The identity account itself is created by the identity provider;
    /// `uid` links to it when already known.
    pub async fn add_staff(
        &self,
        owner: Option<&Actor>,
        name: &str,
        email: &str,
        uid: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<StaffMember> {
        self.access.require_owner(owner).await?;

        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::Validation("staff name is required".into()));
        }
        if !email.contains('@') {
            return Err(Error::Validation(format!("'{email}' is not an email address")));
        }

        let member = StaffMember {
            uid: uid
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string),
            name: name.to_string(),
            email,
            role: Role::Admin,
            added_at: now,
        };

        let member = self
            .store
            .transaction(|db| {
                if db.staff_with_email(&member.email).is_some() {
                    return Err(Error::Conflict(format!("{} is already staff", member.email)));
                }
                if db.staff.contains_key(&member.uid) {
                    return Err(Error::Conflict(format!("uid {} is already staff", member.uid)));
                }
                db.staff.insert(member.uid.clone(), member.clone());
                Ok(member)
            })
            .await?;

        info!(uid = %member.uid, email = %member.email, "Staff member added");
        Ok(member)
    }

    pub async fn remove_staff(&self, owner: Option<&Actor>, uid: &str) -> Result<StaffMember> {
        self.access.require_owner(owner).await?;
        let removed = self
            .store
            .transaction(|db| {
                db.staff
                    .remove(uid)
                    .ok_or_else(|| Error::not_found("staff member", uid))
            })
            .await?;
        info!(uid = %removed.uid, email = %removed.email, "Staff member removed");
        Ok(removed)
    }

    pub async fn list(&self, actor: Option<&Actor>) -> Result<Vec<StaffMember>> {
        self.access.require_staff(actor).await?;
        let mut staff: Vec<StaffMember> = self.store.read(|db| db.staff.values().cloned().collect()).await;
        staff.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(staff)
    }
}
