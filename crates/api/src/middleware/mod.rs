//! Request extractors for authentication.
//!
//! - [`auth::AuthUser`] -- the caller from a valid Bearer token, else 401.
//! - [`auth::MaybeAuthUser`] -- the caller when a valid token is present.

pub mod auth;
