//! HTTP front end for protolane.
//!
//! Wraps the core components behind three routes: `POST /parse` compiles an
//! uploaded schema archive into a descriptor set, `POST /send` relays a
//! binary payload under the configured host policy, and `GET /health`
//! answers liveness probes. [`AppState::assemble`] is the only place services
//! are constructed.

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::create_router;
pub use state::AppState;
