// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Derived path resolution.
//!
//! The on-disk folder of a container is a pure function of its immutable
//! fields and its key, so no path is ever written to the database. Any
//! holder of the container row can recompute the folder; renaming a
//! container after creation would orphan the folder, which is why container
//! names are treated as immutable.

use std::path::PathBuf;

use crate::crypto::NameCipher;

use super::containers::StorageContainer;
use super::paths::StoragePaths;

/// Resolves container folders and item file paths from metadata.
pub struct PathResolver<'a> {
    paths: &'a StoragePaths,
    cipher: NameCipher,
}

impl<'a> PathResolver<'a> {
    pub fn new(paths: &'a StoragePaths) -> Self {
        Self {
            paths,
            cipher: NameCipher::new(),
        }
    }

    /// Directory holding a container's files.
    ///
    /// The folder identity is `{id}{name without whitespace}{owner}`,
    /// encrypted under the container key into a path-safe token.
    pub fn container_dir(&self, container: &StorageContainer) -> PathBuf {
        let name: String = container
            .name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let identity = format!("{}{}{}", container.id, name, container.owner_user_id);
        let token = self.cipher.encrypt(&identity, &container.encryption_key);
        self.paths.container_dir(&token)
    }

    /// Full path of an item inside its container.
    ///
    /// The stored file name is already an encrypted token plus plaintext
    /// extension, so this is a plain join.
    pub fn item_path(&self, container: &StorageContainer, encrypted_file_name: &str) -> PathBuf {
        self.container_dir(container).join(encrypted_file_name)
    }
}
