//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - A `Deserialize` + `Validate` update DTO (all `Option` fields) for patches
//!
//! Nullable columns in update DTOs are `Option<Option<T>>`: an absent field
//! keeps the stored value, an explicit `null` clears it.

pub mod character;
pub mod import;
pub mod manuscript;
pub mod scene;
pub mod session;
pub mod tag;
pub mod timeline;
pub mod universe;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including `null`) as `Some`, so that an
/// absent field stays `None` through `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
