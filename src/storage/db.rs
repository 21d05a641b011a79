// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Embedded metadata database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `containers`: container_id → serialized StorageContainer
//! - `container_owner_index`: composite key (owner_user_id|container_id) → container_id
//! - `items`: item_id → serialized StorageContainerItem
//! - `container_items_index`: composite key (container_id|item_id) → item_id

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::containers::StorageContainer;
use super::items::{ItemStatus, StorageContainerItem};
use super::{StorageError, StorageResult};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary container table: container_id → JSON bytes.
const CONTAINERS: TableDefinition<&str, &[u8]> = TableDefinition::new("containers");

/// Index: `owner_user_id|container_id` → container_id, for per-owner scans.
const CONTAINER_OWNER_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("container_owner_index");

/// Primary item table: item_id → JSON bytes.
const ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("items");

/// Index: `container_id|item_id` → item_id, for per-container scans.
const CONTAINER_ITEMS_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("container_items_index");

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key `parent|child` for the index tables.
///
/// Both segments are UUIDs or JWT subject ids, neither of which contains
/// the `|` separator.
fn make_index_key(parent: &str, child: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(parent.len() + 1 + child.len());
    key.extend_from_slice(parent.as_bytes());
    key.push(b'|');
    key.extend_from_slice(child.as_bytes());
    key
}

/// Build a prefix for range-scanning all children of a parent.
fn make_prefix(parent: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(parent.len() + 1);
    prefix.extend_from_slice(parent.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a range scan (prefix with 0xFF bytes appended).
fn make_prefix_end(parent: &str) -> Vec<u8> {
    let mut end = make_prefix(parent);
    end.extend_from_slice(&[0xFF; 40]);
    end
}

// =============================================================================
// MetadataDb
// =============================================================================

/// Embedded ACID store for container and item rows.
pub struct MetadataDb {
    db: Database,
}

impl MetadataDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CONTAINERS)?;
            let _ = write_txn.open_table(CONTAINER_OWNER_INDEX)?;
            let _ = write_txn.open_table(ITEMS)?;
            let _ = write_txn.open_table(CONTAINER_ITEMS_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Container rows
    // =========================================================================

    /// Insert a new container row and its owner index entry.
    pub fn insert_container(&self, container: &StorageContainer) -> StorageResult<()> {
        let json = serde_json::to_vec(container)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONTAINERS)?;
            table.insert(container.id.as_str(), json.as_slice())?;

            let mut idx = write_txn.open_table(CONTAINER_OWNER_INDEX)?;
            let key = make_index_key(&container.owner_user_id, &container.id);
            idx.insert(key.as_slice(), container.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a single container by id.
    pub fn get_container(&self, container_id: &str) -> StorageResult<Option<StorageContainer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTAINERS)?;
        match table.get(container_id)? {
            Some(value) => {
                let container: StorageContainer = serde_json::from_slice(value.value())?;
                Ok(Some(container))
            }
            None => Ok(None),
        }
    }

    /// List all containers belonging to an owner.
    pub fn list_containers_by_owner(&self, owner_user_id: &str) -> StorageResult<Vec<StorageContainer>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(CONTAINER_OWNER_INDEX)?;
        let table = read_txn.open_table(CONTAINERS)?;

        let prefix = make_prefix(owner_user_id);
        let prefix_end = make_prefix_end(owner_user_id);

        let mut containers = Vec::new();
        for entry in idx.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let container_id = entry.1.value();
            if let Some(value) = table.get(container_id)? {
                containers.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(containers)
    }

    // =========================================================================
    // Item rows
    // =========================================================================

    /// Insert a new item row and its container index entry.
    pub fn insert_item(&self, item: &StorageContainerItem) -> StorageResult<()> {
        let json = serde_json::to_vec(item)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ITEMS)?;
            table.insert(item.id.as_str(), json.as_slice())?;

            let mut idx = write_txn.open_table(CONTAINER_ITEMS_INDEX)?;
            let key = make_index_key(&item.container_id, &item.id);
            idx.insert(key.as_slice(), item.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a single item by id.
    pub fn get_item(&self, item_id: &str) -> StorageResult<Option<StorageContainerItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;
        match table.get(item_id)? {
            Some(value) => {
                let item: StorageContainerItem = serde_json::from_slice(value.value())?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Overwrite an existing item row (status promotion).
    pub fn update_item(&self, item: &StorageContainerItem) -> StorageResult<()> {
        let json = serde_json::to_vec(item)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ITEMS)?;
            if table.get(item.id.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("item {}", item.id)));
            }
            table.insert(item.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove an item row and its index entry.
    pub fn remove_item(&self, item: &StorageContainerItem) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ITEMS)?;
            table.remove(item.id.as_str())?;

            let mut idx = write_txn.open_table(CONTAINER_ITEMS_INDEX)?;
            let key = make_index_key(&item.container_id, &item.id);
            idx.remove(key.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List all items of a container, pending ones included.
    pub fn list_items_by_container(
        &self,
        container_id: &str,
    ) -> StorageResult<Vec<StorageContainerItem>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(CONTAINER_ITEMS_INDEX)?;
        let table = read_txn.open_table(ITEMS)?;

        let prefix = make_prefix(container_id);
        let prefix_end = make_prefix_end(container_id);

        let mut items = Vec::new();
        for entry in idx.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let item_id = entry.1.value();
            if let Some(value) = table.get(item_id)? {
                items.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(items)
    }

    /// Full scan for pending item rows, used by the reconciliation sweep.
    pub fn list_pending_items(&self) -> StorageResult<Vec<StorageContainerItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;

        let mut items = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let item: StorageContainerItem = serde_json::from_slice(entry.1.value())?;
            if item.status == ItemStatus::Pending {
                items.push(item);
            }
        }
        Ok(items)
    }
}

// =============================================================================
// Tests
// =============================================================================
