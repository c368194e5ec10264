//! Identity provider boundary.
//!
//! The client consumes identity presence as its sole authorization signal:
//! who the identity is never matters here, only whether one is present,
//! because every cached and remote datum is scoped to exactly one
//! authenticated identity at a time.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// An opaque authenticated principal.
///
/// The client never inspects the contents; it only compares identities to
/// detect transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Wrap a principal string.
    pub fn new(principal: impl Into<String>) -> Self {
        Self(principal.into())
    }

    /// The principal as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asynchronous identity provider.
///
/// `login` resolves once sign-in completes; `clear` signs out
/// synchronously. The current identity is observable at any time, with
/// `None` meaning "definitively absent", not "still resolving"; the
/// session layer tracks resolution separately.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently authenticated identity, if any.
    async fn identity(&self) -> Option<Identity>;

    /// Initiate sign-in and resolve to the authenticated identity.
    async fn login(&self) -> Result<Identity>;

    /// Sign out. Synchronous; takes effect immediately.
    fn clear(&self);
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    async fn identity(&self) -> Option<Identity> {
        (**self).identity().await
    }

    async fn login(&self) -> Result<Identity> {
        (**self).login().await
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// An [`IdentityProvider`] with a settable identity, for tests and local
/// development.
///
/// `login` succeeds with the configured identity, or fails when none was
/// configured. [`StaticIdentity::set_identity`] switches the principal
/// directly, which tests use to simulate an identity change.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    configured: Mutex<Option<Identity>>,
    current: Mutex<Option<Identity>>,
}

impl StaticIdentity {
    /// A provider that has no identity and cannot sign in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A provider that signs in as the given principal.
    pub fn with_identity(principal: impl Into<String>) -> Self {
        Self {
            configured: Mutex::new(Some(Identity::new(principal))),
            current: Mutex::new(None),
        }
    }

    /// Replace the current identity directly, bypassing login.
    pub fn set_identity(&self, identity: Option<Identity>) {
        *self.current.lock() = identity;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn identity(&self) -> Option<Identity> {
        self.current.lock().clone()
    }

    async fn login(&self) -> Result<Identity> {
        let configured = self.configured.lock().clone();
        match configured {
            Some(identity) => {
                *self.current.lock() = Some(identity.clone());
                Ok(identity)
            },
            None => Err(Error::SignIn("no identity configured".to_string())),
        }
    }

    fn clear(&self) {
        *self.current.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_then_clear_round_trip() {
        let provider = StaticIdentity::with_identity("alice");
        assert_eq!(provider.identity().await, None);

        let identity = provider.login().await.unwrap();
        assert_eq!(identity.as_str(), "alice");
        assert_eq!(provider.identity().await, Some(identity));

        provider.clear();
        assert_eq!(provider.identity().await, None);
    }

    #[tokio::test]
    async fn anonymous_provider_cannot_sign_in() {
        let provider = StaticIdentity::anonymous();
        assert!(matches!(provider.login().await, Err(Error::SignIn(_))));
    }
}
