pub mod auth;
pub mod character;
pub mod explore;
pub mod export;
pub mod importer;
pub mod scene;
pub mod scope;
pub mod search;
pub mod tag;
pub mod timeline;
pub mod universe;
