//! Core primitives for the Nutrilog client
//!
//! This crate provides the pieces shared by the API client and the CLI:
//!
//! - **Token model**: the `TokenInfo` credential pair and the persisted user
//!   profile, with lenient blob parsing
//! - **Credential store**: an async key-value abstraction over persisted
//!   credentials, with in-memory and file-backed implementations
//! - **Session lifecycle**: atomic clearing of all session entries plus the
//!   `LogoutSink` notification seam
//!
//! # Example
//!
//! ```rust
//! use nutrilog_core::credentials::{CredentialStore, MemoryCredentialStore, TOKEN_KEY};
//! use nutrilog_core::token::TokenInfo;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryCredentialStore::new();
//! store.set(TOKEN_KEY, r#"{"access_token":"A1","refresh_token":"R1"}"#).await?;
//!
//! let blob = store.get(TOKEN_KEY).await?.unwrap();
//! let token = TokenInfo::from_blob(&blob).unwrap();
//! assert!(token.has_access_token());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::{CredentialStore, StoreError, StoreResult};
pub use token::TokenInfo;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::credentials::{
        CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError, StoreResult,
        TOKEN_KEY, USER_INFO_KEY,
    };
    pub use crate::session::{clear_session, LogoutSink, NullLogoutSink};
    pub use crate::token::{TokenInfo, UserProfile};
}
