//! Development server: an in-memory store and an authenticator that
//! provisions any unknown token as a funded user.
//!
//! ```text
//! RUST_LOG=debug PORT=8080 cargo run --bin gauntlet-dev
//! # then connect with ws://localhost:8080/?token=alice
//! ```

use std::sync::Arc;

use gauntlet::prelude::*;
use tracing_subscriber::EnvFilter;

/// 10 SOL.
const STARTING_BALANCE: Lamports = 10_000_000_000;

/// Treats the token as the participant id, creating and funding the user
/// on first sight.
struct DevAuthenticator {
    store: Arc<MemoryStore>,
}

impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<ParticipantId, HubError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(HubError::AuthFailed("missing token".into()));
        }
        let id = ParticipantId::new(credential);

        match self.store.find_user(&id).await {
            Ok(_) => {}
            Err(StoreError::UserNotFound(_)) => {
                self.store.create_user(id.clone(), credential).await;
                self.store
                    .deposit(&id, Currency::Sol, STARTING_BALANCE)
                    .await
                    .map_err(|e| HubError::AuthFailed(e.to_string()))?;
                tracing::info!(participant = %id, balance = STARTING_BALANCE, "provisioned dev user");
            }
            Err(e) => return Err(HubError::AuthFailed(e.to_string())),
        }
        Ok(id)
    }
}

#[tokio::main]
async fn main() -> Result<(), GauntletError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store = Arc::new(MemoryStore::new());
    let auth = DevAuthenticator {
        store: Arc::clone(&store),
    };

    let server = GauntletServerBuilder::new()
        .config(config)
        .build(store, auth)
        .await?;
    tracing::info!(addr = ?server.local_addr(), "gauntlet-dev ready");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
