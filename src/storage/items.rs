// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Item metadata and file transfer.
//!
//! ## Upload discipline
//!
//! For each file the store inserts a `pending` metadata row, then opens the
//! target path with `create_new` so the filesystem itself arbitrates races
//! on the derived name: the loser's open fails with `AlreadyExists`, which
//! *is* the conflict outcome. After the bytes hit disk the row is promoted
//! to `committed`. Rows stuck in `pending` (a crash between the two steps)
//! are invisible to every read path and reaped by [`ItemStore::reconcile`].
//!
//! A conflict aborts the remainder of the batch; files written before the
//! conflicting one are kept, not rolled back.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::crypto::NameCipher;

use super::containers::StorageContainer;
use super::db::MetadataDb;
use super::ownership::OwnedResource;
use super::resolver::PathResolver;
use super::{StorageError, StorageResult};

/// Item row lifecycle status.
///
/// A row is `pending` from insertion until its disk write completes. Only
/// `committed` rows exist as far as listing, download, and delete are
/// concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Committed,
}

/// A stored file's metadata row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageContainerItem {
    /// Unique item identifier (UUID)
    pub id: String,
    /// Container this item belongs to
    pub container_id: String,
    /// Encrypted name stem plus plaintext extension, unique per container
    pub encrypted_file_name: String,
    /// Size of the stored file in bytes
    pub file_size: u64,
    /// Two-phase write marker
    pub status: ItemStatus,
    /// When the row was inserted
    pub created_at: DateTime<Utc>,
    /// When the row was last modified (commit time)
    pub updated_at: Option<DateTime<Utc>>,
}

impl StorageContainerItem {
    /// New row in the `pending` state.
    pub fn pending(container_id: String, encrypted_file_name: String, file_size: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            container_id,
            encrypted_file_name,
            file_size,
            status: ItemStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Promote the row after its disk write succeeded.
    pub fn into_committed(self) -> Self {
        Self {
            status: ItemStatus::Committed,
            updated_at: Some(Utc::now()),
            ..self
        }
    }
}

/// One file of an upload batch, already drained from the request body.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A listed item with its name decrypted for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemEntry {
    /// Unique item identifier
    pub id: String,
    /// Decrypted original file name
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// When the item was uploaded
    pub created_at: DateTime<Utc>,
}

/// Store for item metadata and the bytes behind it, constructed per
/// operation.
pub struct ItemStore<'a> {
    db: &'a MetadataDb,
    resolver: PathResolver<'a>,
    cipher: NameCipher,
}

impl<'a> ItemStore<'a> {
    pub fn new(db: &'a MetadataDb, resolver: PathResolver<'a>) -> Self {
        Self {
            db,
            resolver,
            cipher: NameCipher::new(),
        }
    }

    /// Upload a batch of files into a container.
    ///
    /// Zero-length files are skipped without a trace in metadata. The batch
    /// aborts at the first name conflict; earlier files stay stored. Returns
    /// the number of files written.
    pub fn upload(
        &self,
        user: &AuthenticatedUser,
        container_id: &str,
        files: Vec<UploadFile>,
    ) -> StorageResult<usize> {
        if files.is_empty() {
            return Err(StorageError::Validation(
                "at least one file is required".to_string(),
            ));
        }

        let container = self.get_container(container_id)?;
        container.verify_ownership(user)?;

        // The folder may be missing if directory creation failed during
        // container creation; uploads re-ensure it.
        let dir = self.resolver.container_dir(&container);
        fs::create_dir_all(&dir)?;

        let existing = self.db.list_items_by_container(container_id)?;

        let mut stored = 0;
        for file in files {
            if file.bytes.is_empty() {
                tracing::debug!(file_name = %file.file_name, "skipping zero-length upload");
                continue;
            }

            let encrypted_name = self
                .cipher
                .encrypt_file_name(&file.file_name, &container.encryption_key);

            // A row-level duplicate (committed, or pending from a parallel
            // upload) conflicts even when the disk file has gone missing, so
            // one derived name never maps to two rows.
            if existing
                .iter()
                .any(|item| item.encrypted_file_name == encrypted_name)
            {
                return Err(StorageError::Conflict(format!(
                    "a file named {} already exists in this container",
                    file.file_name
                )));
            }

            let item = StorageContainerItem::pending(
                container.id.clone(),
                encrypted_name.clone(),
                file.bytes.len() as u64,
            );
            self.db.insert_item(&item)?;

            let path = dir.join(&encrypted_name);
            let mut target = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(target) => target,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    self.db.remove_item(&item)?;
                    return Err(StorageError::Conflict(format!(
                        "a file named {} already exists in this container",
                        file.file_name
                    )));
                }
                Err(err) => {
                    self.db.remove_item(&item)?;
                    return Err(err.into());
                }
            };

            if let Err(err) = target.write_all(&file.bytes).and_then(|()| target.flush()) {
                // Best effort: don't leave a half-written file behind the row.
                let _ = fs::remove_file(&path);
                let _ = self.db.remove_item(&item);
                return Err(err.into());
            }

            self.db.update_item(&item.into_committed())?;
            stored += 1;
        }

        tracing::info!(container_id = %container.id, files = stored, "upload complete");
        Ok(stored)
    }

    /// List a container's committed items with decrypted display names.
    pub fn list(
        &self,
        user: &AuthenticatedUser,
        container_id: &str,
    ) -> StorageResult<(StorageContainer, Vec<ItemEntry>)> {
        let container = self.get_container(container_id)?;
        container.verify_ownership(user)?;

        let mut entries = Vec::new();
        for item in self.db.list_items_by_container(container_id)? {
            if item.status != ItemStatus::Committed {
                continue;
            }
            let file_name = self
                .cipher
                .decrypt_file_name(&item.encrypted_file_name, &container.encryption_key)?;
            entries.push(ItemEntry {
                id: item.id,
                file_name,
                size: item.file_size,
                created_at: item.created_at,
            });
        }
        Ok((container, entries))
    }

    /// Read an item's bytes and decrypted file name.
    pub fn download(
        &self,
        user: &AuthenticatedUser,
        item_id: &str,
    ) -> StorageResult<(String, Vec<u8>)> {
        let (item, container) = self.get_committed_item(item_id)?;
        container.verify_ownership(user)?;

        let path = self.resolver.item_path(&container, &item.encrypted_file_name);
        let bytes = fs::read(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(format!("file for item {item_id}"))
            } else {
                StorageError::Io(err)
            }
        })?;

        let file_name = self
            .cipher
            .decrypt_file_name(&item.encrypted_file_name, &container.encryption_key)?;
        Ok((file_name, bytes))
    }

    /// Delete an item's file and metadata row.
    ///
    /// The file goes first; a crash before the row removal leaves an orphan
    /// row whose next same-named upload is blocked by the row-level
    /// duplicate check.
    pub fn delete(&self, user: &AuthenticatedUser, item_id: &str) -> StorageResult<()> {
        let (item, container) = self.get_committed_item(item_id)?;
        container.verify_ownership(user)?;

        let path = self.resolver.item_path(&container, &item.encrypted_file_name);
        if !path.exists() {
            return Err(StorageError::NotFound(format!("file for item {item_id}")));
        }

        fs::remove_file(&path)?;
        self.db.remove_item(&item)?;

        tracing::info!(item_id = %item.id, container_id = %container.id, "deleted item");
        Ok(())
    }

    /// Reap pending rows whose disk write never completed.
    ///
    /// Removes `pending` rows older than `grace` whose backing file is
    /// absent (or whose container row has vanished). Returns the number of
    /// rows removed. Run at startup.
    pub fn reconcile(&self, grace: Duration) -> StorageResult<usize> {
        let cutoff = Utc::now() - grace;
        let mut removed = 0;

        for item in self.db.list_pending_items()? {
            if item.created_at > cutoff {
                continue;
            }

            let stale = match self.db.get_container(&item.container_id)? {
                Some(container) => !self
                    .resolver
                    .item_path(&container, &item.encrypted_file_name)
                    .exists(),
                None => true,
            };

            if stale {
                tracing::warn!(item_id = %item.id, "removing stale pending item row");
                self.db.remove_item(&item)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn get_container(&self, container_id: &str) -> StorageResult<StorageContainer> {
        self.db
            .get_container(container_id)?
            .ok_or_else(|| StorageError::NotFound(format!("container {container_id}")))
    }

    fn get_committed_item(
        &self,
        item_id: &str,
    ) -> StorageResult<(StorageContainerItem, StorageContainer)> {
        let item = self
            .db
            .get_item(item_id)?
            .filter(|item| item.status == ItemStatus::Committed)
            .ok_or_else(|| StorageError::NotFound(format!("item {item_id}")))?;
        let container = self.get_container(&item.container_id)?;
        Ok((item, container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyService;
    use crate::storage::containers::ContainerRegistry;
    use crate::storage::paths::StoragePaths;

    struct TestEnv {
        _dir: tempfile::TempDir,
        db: MetadataDb,
        paths: StoragePaths,
        keys: KeyService,
    }

    impl TestEnv {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = MetadataDb::open(&dir.path().join("meta.redb")).unwrap();
            let paths = StoragePaths::new(dir.path().join("files"));
            Self {
                _dir: dir,
                db,
                paths,
                keys: KeyService::new(),
            }
        }

        fn store(&self) -> ItemStore<'_> {
            ItemStore::new(&self.db, PathResolver::new(&self.paths))
        }

        fn create_container(&self, user: &AuthenticatedUser, name: &str) -> StorageContainer {
            ContainerRegistry::new(&self.db, &self.keys, PathResolver::new(&self.paths))
                .create(user, name)
                .unwrap()
        }
    }

    fn user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(id)
    }

    fn file(name: &str, bytes: &[u8]) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn upload_list_download_delete_cycle() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        let stored = store
            .upload(&owner, &container.id, vec![file("cat.png", b"0123456789")])
            .unwrap();
        assert_eq!(stored, 1);

        let (listed_container, entries) = store.list(&owner, &container.id).unwrap();
        assert_eq!(listed_container.id, container.id);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "cat.png");
        assert_eq!(entries[0].size, 10);

        let (name, bytes) = store.download(&owner, &entries[0].id).unwrap();
        assert_eq!(name, "cat.png");
        assert_eq!(bytes, b"0123456789");

        store.delete(&owner, &entries[0].id).unwrap();

        let (_, entries_after) = store.list(&owner, &container.id).unwrap();
        assert!(entries_after.is_empty());
        assert!(matches!(
            store.download(&owner, &entries[0].id),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn stored_file_names_are_encrypted_on_disk() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        store
            .upload(&owner, &container.id, vec![file("cat.png", b"bytes")])
            .unwrap();

        let dir = PathResolver::new(&env.paths).container_dir(&container);
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names.len(), 1);
        assert_ne!(names[0], "cat.png");
        assert!(names[0].ends_with(".png"), "extension stays plaintext");
    }

    #[test]
    fn zero_length_files_are_skipped() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        let stored = store
            .upload(&owner, &container.id, vec![file("empty.txt", b"")])
            .unwrap();
        assert_eq!(stored, 0);

        assert!(env.db.list_items_by_container(&container.id).unwrap().is_empty());
        let dir = PathResolver::new(&env.paths).container_dir(&container);
        assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");

        let result = env.store().upload(&owner, &container.id, Vec::new());
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }

    #[test]
    fn duplicate_name_conflicts_and_keeps_single_row() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        store
            .upload(&owner, &container.id, vec![file("cat.png", b"first")])
            .unwrap();

        let result = store.upload(&owner, &container.id, vec![file("cat.png", b"second")]);
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        // One row, and the first write's bytes are untouched.
        let items = env.db.list_items_by_container(&container.id).unwrap();
        assert_eq!(items.len(), 1);

        let (_, entries) = store.list(&owner, &container.id).unwrap();
        let (_, bytes) = store.download(&owner, &entries[0].id).unwrap();
        assert_eq!(bytes, b"first");
    }

    #[test]
    fn batch_conflict_keeps_files_stored_before_it() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        store
            .upload(&owner, &container.id, vec![file("dup.txt", b"original")])
            .unwrap();

        let result = store.upload(
            &owner,
            &container.id,
            vec![file("fresh.txt", b"kept"), file("dup.txt", b"clash")],
        );
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        // fresh.txt was processed before the conflict and stays stored.
        let (_, entries) = store.list(&owner, &container.id).unwrap();
        let mut names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["dup.txt", "fresh.txt"]);
    }

    #[test]
    fn cross_user_access_is_unauthorized() {
        let env = TestEnv::new();
        let owner = user("user_a");
        let intruder = user("user_b");
        let container = env.create_container(&owner, "Private");
        let store = env.store();

        store
            .upload(&owner, &container.id, vec![file("secret.txt", b"hidden")])
            .unwrap();
        let (_, entries) = store.list(&owner, &container.id).unwrap();
        let item_id = entries[0].id.clone();

        assert!(matches!(
            store.upload(&intruder, &container.id, vec![file("x.txt", b"x")]),
            Err(StorageError::Unauthorized)
        ));
        assert!(matches!(
            store.list(&intruder, &container.id),
            Err(StorageError::Unauthorized)
        ));
        assert!(matches!(
            store.download(&intruder, &item_id),
            Err(StorageError::Unauthorized)
        ));
        assert!(matches!(
            store.delete(&intruder, &item_id),
            Err(StorageError::Unauthorized)
        ));

        // Nothing was mutated by the denied calls.
        let (_, entries) = store.list(&owner, &container.id).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn delete_missing_item_is_not_found() {
        let env = TestEnv::new();
        let owner = user("user_u");
        env.create_container(&owner, "Photos");

        let result = env.store().delete(&owner, "no-such-item");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn upload_to_missing_container_is_not_found() {
        let env = TestEnv::new();
        let result = env
            .store()
            .upload(&user("user_u"), "no-container", vec![file("a.txt", b"a")]);
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn upload_recreates_missing_container_directory() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        let dir = PathResolver::new(&env.paths).container_dir(&container);
        fs::remove_dir_all(&dir).unwrap();

        store
            .upload(&owner, &container.id, vec![file("back.txt", b"again")])
            .unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn pending_rows_are_invisible_and_reconciled() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        // Simulate a crash after the row insert, before the disk write.
        let orphan = StorageContainerItem::pending(container.id.clone(), "GHOST.bin".into(), 42);
        env.db.insert_item(&orphan).unwrap();

        let (_, entries) = store.list(&owner, &container.id).unwrap();
        assert!(entries.is_empty());
        assert!(matches!(
            store.download(&owner, &orphan.id),
            Err(StorageError::NotFound(_))
        ));

        // Inside the grace period the row is left alone.
        assert_eq!(store.reconcile(Duration::hours(1)).unwrap(), 0);

        // Past the grace period it is reaped.
        assert_eq!(store.reconcile(Duration::zero()).unwrap(), 1);
        assert!(env.db.get_item(&orphan.id).unwrap().is_none());
    }

    #[test]
    fn reconcile_leaves_pending_rows_with_files_alone() {
        let env = TestEnv::new();
        let owner = user("user_u");
        let container = env.create_container(&owner, "Photos");
        let store = env.store();

        let item = StorageContainerItem::pending(container.id.clone(), "HALF.bin".into(), 4);
        env.db.insert_item(&item).unwrap();
        let path = PathResolver::new(&env.paths).item_path(&container, "HALF.bin");
        fs::write(&path, b"data").unwrap();

        assert_eq!(store.reconcile(Duration::zero()).unwrap(), 0);
        assert!(env.db.get_item(&item.id).unwrap().is_some());
    }
}
