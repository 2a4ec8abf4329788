//! HTTP API.
//!
//! Exposes the claim workflow as JSON endpoints under `/api/`. The router
//! is composable: `api_router()` returns a `Router` that can be mounted on
//! any axum server.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use types::ApiContext;
