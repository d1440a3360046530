use super::storage::CredentialStore;
use crate::error::Result;
use crate::models::Identity;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Slots {
    identity: Option<Identity>,
    token: Option<String>,
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slots: Mutex<Slots>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn identity(&self) -> Option<Identity> {
        self.slots().identity.clone()
    }

    fn token(&self) -> Option<String> {
        self.slots().token.clone()
    }

    fn set_identity(&self, identity: Option<&Identity>) -> Result<()> {
        self.slots().identity = identity.cloned();
        Ok(())
    }

    fn set_token(&self, token: Option<&str>) -> Result<()> {
        self.slots().token = token.filter(|t| !t.is_empty()).map(str::to_string);
        Ok(())
    }
}
