//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Operations spanning
//! several statements open their own transaction.

pub mod branch_repo;
pub mod character_repo;
pub mod export_repo;
pub mod fork_repo;
pub mod import_repo;
pub mod manuscript_repo;
pub mod scene_repo;
pub mod session_repo;
pub mod tag_repo;
pub mod timeline_repo;
pub mod universe_repo;
pub mod user_repo;

pub use branch_repo::BranchRepo;
pub use character_repo::CharacterRepo;
pub use export_repo::ExportRepo;
pub use fork_repo::ForkRepo;
pub use import_repo::ImportRepo;
pub use manuscript_repo::ManuscriptRepo;
pub use scene_repo::SceneRepo;
pub use session_repo::SessionRepo;
pub use tag_repo::TagRepo;
pub use timeline_repo::TimelineRepo;
pub use universe_repo::UniverseRepo;
pub use user_repo::UserRepo;
