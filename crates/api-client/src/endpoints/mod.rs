//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for a specific set of backend
//! endpoints, with request/response types co-located.
//!
//! ## Mapping to the Nutrilog backend
//!
//! | Module | Backend routes | Description |
//! |--------|---------------|-------------|
//! | `auth` | `/auth/*` | Token refresh, Google sign-in, sign-out |
//! | `diet` | `/diet/*` | Daily diet log and intake recording |
//! | `ingredient` | `/ingredient/*` | Ingredient catalog CRUD and search |
//!
//! Every route except `/auth/refresh_token` and `/auth/mobile/google-auth`
//! is authenticated and rides the client's bearer/refresh protocol.

pub mod auth;
pub mod diet;
pub mod ingredient;

pub use auth::AuthApi;
pub use diet::DietApi;
pub use ingredient::IngredientApi;
