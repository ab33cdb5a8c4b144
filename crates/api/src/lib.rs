//! Storyverse API server library.
//!
//! Exposes config, state, error handling, auth and routes so the server
//! binary, the CLI and the integration tests share one definition.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
