//! Connection registry for Gauntlet.
//!
//! - [`HubHandle`]: the single-owner actor tracking live connections,
//!   their outbound queues and lobby presence, with periodic
//!   `LOBBY_SNAPSHOT` broadcasts.
//! - [`Authenticator`]: the identity hook run before registration.

#![allow(async_fn_in_trait)]

mod auth;
mod config;
mod error;
mod hub;

pub use auth::{Authenticator, TrustingAuthenticator};
pub use config::HubConfig;
pub use error::HubError;
pub use hub::{DEFAULT_CHARACTER, HubHandle, HubStats, LOBBY_SPAWN, OutboundReceiver};
