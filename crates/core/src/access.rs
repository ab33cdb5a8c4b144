//! Ownership-based access policy for universes.
//!
//! Every timeline, scene, character and tag inherits the policy of the
//! universe that owns it. Handlers resolve the owning universe first and then
//! ask [`UniverseAccess`] before reading or writing anything.

use crate::error::CoreError;
use crate::types::DbId;

/// The access-relevant attributes of a universe.
#[derive(Debug, Clone, Copy)]
pub struct UniverseAccess {
    pub owner_id: DbId,
    pub is_public: bool,
    pub allow_fork: bool,
}

impl UniverseAccess {
    pub fn is_owner(&self, user_id: DbId) -> bool {
        self.owner_id == user_id
    }

    pub fn can_view(&self, user_id: DbId) -> bool {
        self.is_owner(user_id) || self.is_public
    }

    pub fn can_update(&self, user_id: DbId) -> bool {
        self.is_owner(user_id)
    }

    pub fn can_delete(&self, user_id: DbId) -> bool {
        self.is_owner(user_id)
    }

    /// Forking is for other users' public, fork-enabled universes.
    pub fn can_fork(&self, user_id: DbId) -> bool {
        self.is_public && self.allow_fork && !self.is_owner(user_id)
    }

    pub fn ensure_view(&self, user_id: DbId) -> Result<(), CoreError> {
        check(self.can_view(user_id), "You do not have access to this universe")
    }

    pub fn ensure_update(&self, user_id: DbId) -> Result<(), CoreError> {
        check(self.can_update(user_id), "Only the owner can modify this universe")
    }

    pub fn ensure_delete(&self, user_id: DbId) -> Result<(), CoreError> {
        check(self.can_delete(user_id), "Only the owner can delete this universe")
    }

    pub fn ensure_fork(&self, user_id: DbId) -> Result<(), CoreError> {
        check(self.can_fork(user_id), "This universe cannot be forked")
    }
}

fn check(allowed: bool, message: &str) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const OWNER: DbId = 1;
    const OTHER: DbId = 2;

    fn universe(is_public: bool, allow_fork: bool) -> UniverseAccess {
        UniverseAccess {
            owner_id: OWNER,
            is_public,
            allow_fork,
        }
    }

    #[test]
    fn owner_can_do_everything_but_fork() {
        let u = universe(true, true);
        assert!(u.can_view(OWNER));
        assert!(u.can_update(OWNER));
        assert!(u.can_delete(OWNER));
        assert!(!u.can_fork(OWNER));
    }

    #[test]
    fn private_universe_is_hidden_from_others() {
        let u = universe(false, true);
        assert_matches!(u.ensure_view(OTHER), Err(CoreError::Forbidden(_)));
        assert_matches!(u.ensure_update(OTHER), Err(CoreError::Forbidden(_)));
        assert_matches!(u.ensure_fork(OTHER), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn public_universe_is_read_only_for_others() {
        let u = universe(true, false);
        assert!(u.ensure_view(OTHER).is_ok());
        assert_matches!(u.ensure_update(OTHER), Err(CoreError::Forbidden(_)));
        assert_matches!(u.ensure_delete(OTHER), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn fork_requires_public_and_allow_fork() {
        assert!(universe(true, true).can_fork(OTHER));
        assert!(!universe(true, false).can_fork(OTHER));
        assert!(!universe(false, true).can_fork(OTHER));
    }
}
