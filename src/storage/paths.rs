// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Path utilities for the derived storage tree.

use std::path::{Path, PathBuf};

/// Default root directory for stored files, relative to the working
/// directory. Overridden with the `STORAGE_ROOT` environment variable.
pub const STORAGE_ROOT: &str = "storage";

/// Root of the on-disk storage tree.
///
/// Only the root is configuration; everything below it is an encrypted
/// token computed by the path resolver.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(STORAGE_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all stored files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a container, given its encrypted folder token.
    pub fn container_dir(&self, folder_token: &str) -> PathBuf {
        self.root.join(folder_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_storage_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("storage"));
    }

    #[test]
    fn container_dir_joins_token() {
        let paths = StoragePaths::new("/tmp/coffer-test");
        assert_eq!(
            paths.container_dir("AbCd,Ef"),
            PathBuf::from("/tmp/coffer-test/AbCd,Ef")
        );
    }
}
