//! `GauntletServer` builder and accept loop.
//!
//! Building a server wires the layers together: the WebSocket transport,
//! the hub, a game room over the caller's store, and the matchmaker that
//! feeds pairs into that room.

use std::sync::Arc;
use std::time::Duration;

use gauntlet_arena::{GameRoom, MatchmakerHandle};
use gauntlet_hub::{Authenticator, HubHandle};
use gauntlet_protocol::{JsonCodec, Lamports};
use gauntlet_store::Store;
use gauntlet_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{GauntletError, ServerConfig};

/// Shared state handed to every connection task.
pub(crate) struct ServerState<A: Authenticator> {
    pub(crate) hub: HubHandle,
    pub(crate) matchmaker: MatchmakerHandle,
    pub(crate) auth: A,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Gauntlet server.
///
/// # Example
///
/// ```rust,ignore
/// use gauntlet::prelude::*;
///
/// let server = GauntletServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(store, TrustingAuthenticator)
///     .await?;
/// server.run().await
/// ```
pub struct GauntletServerBuilder {
    config: ServerConfig,
}

impl GauntletServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Idle time after which a connection is dropped.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Wager used when a client joins the queue without naming one.
    pub fn default_wager(mut self, lamports: Lamports) -> Self {
        self.config.default_wager = lamports;
        self
    }

    /// Binds the listener and spawns the hub and matchmaker.
    pub async fn build<S, A>(
        self,
        store: Arc<S>,
        auth: A,
    ) -> Result<GauntletServer<A>, GauntletError>
    where
        S: Store,
        A: Authenticator,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let hub = HubHandle::spawn(self.config.hub.clone());
        let room = GameRoom::new(store, hub.clone(), self.config.settlement.clone());
        let matchmaker = MatchmakerHandle::spawn(self.config.matchmaker.clone(), hub.clone(), room);

        let state = Arc::new(ServerState {
            hub,
            matchmaker,
            auth,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(GauntletServer { transport, state })
    }
}

impl Default for GauntletServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gauntlet server. Call [`run()`](Self::run) to start accepting
/// connections.
pub struct GauntletServer<A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> GauntletServer<A> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the hub, for pushing server-initiated messages.
    pub fn hub(&self) -> &HubHandle {
        &self.state.hub
    }

    /// Runs the accept loop, spawning one handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GauntletError> {
        tracing::info!(addr = %self.state.config.bind_addr, "gauntlet server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
