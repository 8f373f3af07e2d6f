//! Identity hook consulted before a connection is registered.
//!
//! Gauntlet does not issue or validate credentials itself. The server
//! hands whatever credential the client presented at upgrade time to an
//! [`Authenticator`] and registers the connection under the returned
//! [`ParticipantId`].

use std::future::Future;

use gauntlet_protocol::ParticipantId;

use crate::HubError;

/// Turns a connection credential into a verified participant id.
///
/// # Example
///
/// ```rust
/// use gauntlet_hub::{Authenticator, HubError};
/// use gauntlet_protocol::ParticipantId;
///
/// /// Accepts tokens of the form `user:<id>`.
/// struct PrefixAuthenticator;
///
/// impl Authenticator for PrefixAuthenticator {
///     async fn authenticate(&self, credential: &str) -> Result<ParticipantId, HubError> {
///         credential
///             .strip_prefix("user:")
///             .map(ParticipantId::new)
///             .ok_or_else(|| HubError::AuthFailed("unrecognised token".into()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `credential`.
    ///
    /// Returns [`HubError::AuthFailed`] when the credential is invalid or
    /// expired.
    fn authenticate(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<ParticipantId, HubError>> + Send;
}

/// Accepts any non-empty credential as the participant id.
///
/// Only suitable for local development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingAuthenticator;

impl Authenticator for TrustingAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<ParticipantId, HubError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(HubError::AuthFailed("empty credential".into()));
        }
        Ok(ParticipantId::new(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trusting_authenticator_uses_credential_as_id() {
        let id = TrustingAuthenticator.authenticate("alice").await.unwrap();
        assert_eq!(id, ParticipantId::new("alice"));
    }

    #[tokio::test]
    async fn test_trusting_authenticator_rejects_blank() {
        let err = TrustingAuthenticator.authenticate("  ").await.unwrap_err();
        assert!(matches!(err, HubError::AuthFailed(_)));
    }
}
