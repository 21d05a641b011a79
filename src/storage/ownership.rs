// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Ownership enforcement for storage operations.
//!
//! Every read or mutation of a container (or anything inside it) must pass
//! through an ownership check against the authenticated caller. Failures
//! surface as [`StorageError::Unauthorized`] without saying whether the
//! resource exists under a different owner.

use crate::auth::AuthenticatedUser;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    /// Verify that the user owns this resource.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if self.owner_user_id() == user.user_id {
            Ok(())
        } else {
            Err(StorageError::Unauthorized)
        }
    }
}
