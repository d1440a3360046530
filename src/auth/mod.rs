mod callback;
mod oauth;
mod pkce;

pub use callback::{wait_for_callback, CallbackParams, CALLBACK_PATH};
pub use oauth::{OAuthProvider, OAuthSettings, TokenResponse, UserInfo};
pub use pkce::{challenge_for, PkcePair};

use crate::error::Result;
use crate::models::Credential;
use std::future::Future;
use tokio::sync::watch;

/// An external identity provider.
///
/// The provider owns the actual authentication protocol. Consumers see an
/// interactive sign-in that yields a [`Credential`], a sign-out, an optional
/// token refresh, and a stream of session changes.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Run the interactive sign-in handshake.
    ///
    /// Fails with an auth error when the user cancels or the provider refuses.
    fn sign_in(&self) -> impl Future<Output = Result<Credential>> + Send;

    /// Invalidate the provider-side session.
    ///
    /// Publishes `None` to subscribers before returning, even when the
    /// remote invalidation fails.
    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;

    /// Obtain a fresh bearer token for the live session.
    ///
    /// Returns `Ok(None)` when there is no session to refresh from.
    fn refresh_token(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Subscribe to session changes. `None` means signed out.
    fn subscribe(&self) -> watch::Receiver<Option<Credential>>;
}
