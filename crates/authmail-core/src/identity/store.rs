//! Identity storage and the active-identity pointer.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use super::model::{Identity, TokenUpdate};
use crate::error::{Error, Result};

/// Storage for identity records plus the single active-identity pointer.
///
/// All mutation paths are driven sequentially by the orchestrator, so
/// implementations need no transactional guarantees beyond their own
/// internal consistency.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Upserts an identity by email.
    ///
    /// Callers must only pass identities whose refresh token is non-empty;
    /// that invariant is enforced by the authorization flow, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    async fn save(&self, identity: Identity) -> Result<()>;

    /// Looks up an identity by email. Absence is a valid result.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Merges the supplied token fields into the stored identity's tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityNotFound`] if no identity exists under
    /// `email`.
    async fn update_tokens(&self, email: &str, update: TokenUpdate) -> Result<()>;

    /// Returns the active identity, if the pointer is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActiveIdentityNotFound`] if the pointer names an
    /// identity that does not exist.
    async fn get_active(&self) -> Result<Option<Identity>>;

    /// Moves the active-identity pointer. This is the only way it changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityNotFound`] if no identity exists under
    /// `email`.
    async fn set_active(&self, email: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct Records {
    identities: HashMap<String, Identity>,
    active: Option<String>,
}

/// In-memory identity store; durable for the process lifetime only.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    records: Mutex<Records>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn save(&self, identity: Identity) -> Result<()> {
        debug!(email = %identity.email, "saving identity");
        self.lock().identities.insert(identity.email.clone(), identity);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.lock().identities.get(email).cloned())
    }

    async fn update_tokens(&self, email: &str, update: TokenUpdate) -> Result<()> {
        let mut records = self.lock();
        let identity = records
            .identities
            .get_mut(email)
            .ok_or_else(|| Error::IdentityNotFound(email.to_string()))?;
        identity.tokens.merge(update);
        Ok(())
    }

    async fn get_active(&self) -> Result<Option<Identity>> {
        let records = self.lock();
        let Some(email) = records.active.as_deref() else {
            return Ok(None);
        };
        records
            .identities
            .get(email)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::ActiveIdentityNotFound(email.to_string()))
    }

    async fn set_active(&self, email: &str) -> Result<()> {
        let mut records = self.lock();
        if !records.identities.contains_key(email) {
            return Err(Error::IdentityNotFound(email.to_string()));
        }
        records.active = Some(email.to_string());
        Ok(())
    }
}
