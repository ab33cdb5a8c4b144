//! Pure domain logic for storyverse.
//!
//! Nothing in this crate performs I/O. The `db` and `api` crates build on
//! these types, rules and plans.

pub mod access;
pub mod branching;
pub mod error;
pub mod export;
pub mod importer;
pub mod ordering;
pub mod search;
pub mod text;
pub mod types;
pub mod validation;
