use crate::api::RecordApi;
use crate::auth::IdentityProvider;
use crate::error::Result;
use crate::models::Identity;
use crate::session::SessionManager;
use crate::sync::{RecordSynchronizer, StatusMessage};
use std::sync::Arc;
use tracing::debug;

/// The signed-in/signed-out screen: one session plus the records it guards.
pub struct Dashboard<P, A> {
    session: Arc<SessionManager<P>>,
    records: RecordSynchronizer<P, A>,
}

impl<P: IdentityProvider, A: RecordApi> Dashboard<P, A> {
    pub fn new(session: Arc<SessionManager<P>>, api: A) -> Self {
        let records = RecordSynchronizer::new(Arc::clone(&session), api);
        Self { session, records }
    }

    pub fn session(&self) -> &SessionManager<P> {
        &self.session
    }

    pub fn records(&self) -> &RecordSynchronizer<P, A> {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut RecordSynchronizer<P, A> {
        &mut self.records
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Load the collection if a session survived from an earlier run.
    pub async fn restore(&mut self) -> Result<()> {
        if !self.is_signed_in() {
            debug!("no stored session");
            return Ok(());
        }
        self.records.list().await
    }

    /// Sign in, then fetch the full collection.
    pub async fn login(&mut self) -> Result<Identity> {
        let identity = match self.session.sign_in().await {
            Ok(identity) => identity,
            Err(e) => {
                self.records
                    .set_status(StatusMessage::error("Login failed. Please try again."));
                return Err(e);
            }
        };

        self.records
            .set_status(StatusMessage::info("Logged in successfully."));
        // A failed fetch sets its own status; the sign-in itself stands.
        let _ = self.records.list().await;

        Ok(identity)
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.session.sign_out().await?;
        self.records.clear();
        self.records
            .set_status(StatusMessage::info("Logged out successfully."));
        Ok(())
    }
}
