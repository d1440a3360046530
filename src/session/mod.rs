mod filesystem;
mod memory;
mod storage;

pub use filesystem::FilesystemCredentialStore;
pub use memory::MemoryCredentialStore;
pub use storage::CredentialStore;

use crate::auth::IdentityProvider;
use crate::error::{Result, UserdeskError};
use crate::models::{Credential, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How [`SessionManager::bearer_token`] obtains the token for a request.
///
/// `Cached` never touches the network but may hand out an expired token.
/// `RefreshOnRead` costs one provider round-trip per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TokenPolicy {
    #[default]
    Cached,
    RefreshOnRead,
}

impl fmt::Display for TokenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPolicy::Cached => write!(f, "cached"),
            TokenPolicy::RefreshOnRead => write!(f, "refresh-on-read"),
        }
    }
}

impl FromStr for TokenPolicy {
    type Err = UserdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cached" => Ok(TokenPolicy::Cached),
            "refresh-on-read" | "refresh_on_read" | "refresh" => Ok(TokenPolicy::RefreshOnRead),
            other => Err(UserdeskError::Config(format!(
                "Unknown token policy '{}' (expected cached or refresh-on-read)",
                other
            ))),
        }
    }
}

/// Owns the operator's session and mirrors it into a [`CredentialStore`].
///
/// Reads are synchronous and served from the store. Writes happen on sign-in,
/// sign-out and whenever the provider reports a session change through the
/// background listener. All writes go through one lock so a stale
/// notification can never land after a local sign-out.
pub struct SessionManager<P> {
    provider: P,
    store: Arc<dyn CredentialStore>,
    writes: Arc<Mutex<()>>,
    policy: TokenPolicy,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<P: IdentityProvider> SessionManager<P> {
    pub fn new(provider: P, store: Arc<dyn CredentialStore>, policy: TokenPolicy) -> Self {
        Self {
            provider,
            store,
            writes: Arc::new(Mutex::new(())),
            policy,
            listener: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Spawn the session-change listener. Calling this again while the first
    /// listener is alive does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_listener(&self) {
        let mut slot = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let mut changes = self.provider.subscribe();
        let store = Arc::clone(&self.store);
        let writes = Arc::clone(&self.writes);
        *slot = Some(tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let credential = changes.borrow_and_update().clone();
                let _guard = writes.lock().unwrap_or_else(|p| p.into_inner());
                if changes.has_changed().unwrap_or(false) {
                    // Superseded while waiting for the lock; the next turn
                    // picks up the newer value.
                    continue;
                }
                debug!(signed_in = credential.is_some(), "provider session changed");
                if let Err(e) = write_credential(store.as_ref(), credential.as_ref()) {
                    warn!(error = %e, "failed to persist session change");
                }
            }
            debug!("provider change stream closed");
        }));
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run the provider's interactive sign-in and persist the result.
    ///
    /// On failure nothing persisted is touched.
    pub async fn sign_in(&self) -> Result<Identity> {
        let credential = self.provider.sign_in().await.map_err(|e| match e {
            UserdeskError::Auth(_) => e,
            other => UserdeskError::Auth(format!("Sign-in failed: {}", other)),
        })?;

        self.write(Some(&credential))?;
        info!(subject = %credential.identity.subject, "signed in");

        Ok(credential.identity)
    }

    /// Sign out at the provider and clear the persisted session.
    ///
    /// The provider call is best-effort; local state is cleared regardless.
    pub async fn sign_out(&self) -> Result<()> {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed; clearing local session anyway");
        }
        self.write(None)?;
        info!("signed out");
        Ok(())
    }

    /// The last persisted token. Never touches the network.
    pub fn get_token(&self) -> Option<String> {
        self.store.token()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.store.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }

    /// The token to attach to an outgoing request, per the configured policy.
    pub async fn bearer_token(&self) -> Result<String> {
        if self.policy == TokenPolicy::RefreshOnRead {
            match self.provider.refresh_token().await? {
                Some(token) => {
                    let _guard = self.writes.lock().unwrap_or_else(|p| p.into_inner());
                    self.store.set_token(Some(&token))?;
                    return Ok(token);
                }
                None => debug!("no live provider session to refresh; using stored token"),
            }
        }

        self.get_token()
            .ok_or_else(|| UserdeskError::Auth("Not signed in".to_string()))
    }

    fn write(&self, credential: Option<&Credential>) -> Result<()> {
        let _guard = self.writes.lock().unwrap_or_else(|p| p.into_inner());
        write_credential(self.store.as_ref(), credential)
    }
}

impl<P> Drop for SessionManager<P> {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(|p| p.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}

fn write_credential(store: &dyn CredentialStore, credential: Option<&Credential>) -> Result<()> {
    store.set_identity(credential.map(|c| &c.identity))?;
    store.set_token(credential.map(|c| c.token.as_str()))?;
    Ok(())
}
