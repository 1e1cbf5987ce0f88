//! Authenticated API client for the Nutrilog backend
//!
//! This crate provides the single chokepoint through which every HTTP call
//! to the backend passes. The client owns the bearer-token lifecycle:
//!
//! - **Token wait loop**: bounded linear backoff for the startup race where
//!   sign-in has not persisted a token yet
//! - **Bearer attachment**: `Authorization: Bearer <access_token>` injected
//!   into every authenticated call
//! - **Reactive refresh**: a 401 triggers exactly one token refresh and one
//!   reissue of the original request
//! - **Logout escalation**: unrecoverable failures clear the stored session
//!   and notify a [`LogoutSink`](nutrilog_core::session::LogoutSink)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nutrilog_api_client::{ClientConfig, NutrilogClient};
//! use nutrilog_core::credentials::FileCredentialStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileCredentialStore::open_default()?);
//!     let client = NutrilogClient::with_config(ClientConfig::from_env()?, store)?;
//!
//!     let log = client.diet().log("2026-08-25").await?;
//!     println!("intake: {} kcal over {} foods", log.intake, log.intake_foods.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use client::{NutrilogClient, RequestOptions};
pub use config::{ClientConfig, Environment, TokenWaitConfig};
pub use error::{ApiError, ApiResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{NutrilogClient, RequestOptions};
    pub use crate::config::{ClientConfig, Environment, TokenWaitConfig};
    pub use crate::endpoints::{AuthApi, DietApi, IngredientApi};
    pub use crate::error::{ApiError, ApiResult};
}
