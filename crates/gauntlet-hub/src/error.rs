//! Error types for the hub layer.

use gauntlet_protocol::ProtocolError;
use gauntlet_transport::ConnectionId;

/// Errors that can occur while talking to the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The [`Authenticator`](crate::Authenticator) rejected the credential.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A connection with this id is already registered.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// An outbound message could not be encoded.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] ProtocolError),

    /// The hub task has stopped.
    #[error("hub is unavailable")]
    Unavailable,
}
