use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{Database, MemoryStore};

pub const PASSWORD_PROVIDER: &str = "password";

/// Signed-in identity as asserted by the identity provider in front of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub email: Option<String>,
    /// Sign-in method, e.g. "password" or "google.com".
    pub provider: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Actor {
    pub fn new(uid: impl Into<String>, email: Option<&str>, provider: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.map(|e| e.trim().to_lowercase()),
            provider: provider.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AccessLevel {
    Anonymous,
    Customer,
    Staff,
    Owner,
}

/// Owner beats everything; staff must have signed in with a password.
pub fn access_level(db: &Database, owner_uid: &str, actor: Option<&Actor>) -> AccessLevel {
    let Some(actor) = actor else {
        return AccessLevel::Anonymous;
    };

    if !owner_uid.is_empty() && actor.uid == owner_uid {
        return AccessLevel::Owner;
    }

    let is_staff = actor.provider == PASSWORD_PROVIDER
        && actor
            .email
            .as_deref()
            .is_some_and(|email| db.staff_with_email(email).is_some());

    if is_staff {
        AccessLevel::Staff
    } else {
        AccessLevel::Customer
    }
}

pub fn require_signed_in(actor: Option<&Actor>) -> Result<&Actor> {
    actor.ok_or_else(|| Error::Forbidden("sign in required".to_string()))
}

#[derive(Clone)]
pub struct AccessControl {
    store: Arc<MemoryStore>,
    owner_uid: String,
}

impl AccessControl {
    pub fn new(store: Arc<MemoryStore>, owner_uid: impl Into<String>) -> Self {
        Self {
            store,
            owner_uid: owner_uid.into(),
        }
    }

    pub async fn level(&self, actor: Option<&Actor>) -> AccessLevel {
        self.store
            .read(|db| access_level(db, &self.owner_uid, actor))
            .await
    }

    pub async fn require_staff(&self, actor: Option<&Actor>) -> Result<AccessLevel> {
        match self.level(actor).await {
            level @ (AccessLevel::Staff | AccessLevel::Owner) => Ok(level),
            _ => Err(Error::Forbidden("staff access required".to_string())),
        }
    }

    pub async fn require_owner(&self, actor: Option<&Actor>) -> Result<()> {
        match self.level(actor).await {
            AccessLevel::Owner => Ok(()),
            _ => Err(Error::Forbidden("owner access required".to_string())),
        }
    }
}
