//! HTTP API.
//!
//! Exposes the business operations in `crate::actions` as JSON endpoints
//! under `/api/`. Every route except health and registration requires a
//! bearer token.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession};
pub use types::ApiContext;
