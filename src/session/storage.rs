use crate::error::Result;
use crate::models::Identity;

/// Trait for credential storage backends.
///
/// A store holds two independent slots, the serialized identity and the raw
/// bearer token. Passing `None` to a setter clears that slot.
pub trait CredentialStore: Send + Sync {
    /// Read the persisted identity, if any
    fn identity(&self) -> Option<Identity>;

    /// Read the persisted token, if any
    fn token(&self) -> Option<String>;

    /// Replace or clear the identity slot
    fn set_identity(&self, identity: Option<&Identity>) -> Result<()>;

    /// Replace or clear the token slot
    fn set_token(&self, token: Option<&str>) -> Result<()>;
}
