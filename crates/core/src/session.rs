//! Session lifecycle
//!
//! Logging out means one thing: the `token` and `userInfo` entries are
//! removed together, and whoever is listening (typically the presentation
//! layer) is told the session ended so it can fall back to sign-in.

use crate::credentials::{CredentialStore, StoreResult, TOKEN_KEY, USER_INFO_KEY};
use async_trait::async_trait;
use tracing::info;

/// Receiver for session-ended notifications
///
/// Invoked after credentials have already been cleared. Implementations
/// must not assume a token is still readable from the store.
#[async_trait]
pub trait LogoutSink: Send + Sync {
    /// Called once per unrecoverable authentication failure or explicit sign-out
    async fn on_logout(&self);
}

/// Sink that ignores logout notifications
///
/// Default for headless embedders; the CLI and tests install their own.
#[derive(Debug, Default)]
pub struct NullLogoutSink;

#[async_trait]
impl LogoutSink for NullLogoutSink {
    async fn on_logout(&self) {}
}

/// Remove both session entries from the store
///
/// Both keys are removed even if one removal has nothing to delete, so a
/// half-written session cannot survive a logout.
pub async fn clear_session(store: &dyn CredentialStore) -> StoreResult<()> {
    store.remove(TOKEN_KEY).await?;
    store.remove(USER_INFO_KEY).await?;
    info!("session credentials cleared");
    Ok(())
}
