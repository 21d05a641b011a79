// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! # Storage Module
//!
//! Container and item state lives in two places that are deliberately kept
//! close together here:
//!
//! - **Metadata rows** in an embedded redb database ([`db::MetadataDb`]),
//!   one row per container and per item.
//! - **File bytes** on the local filesystem, under a tree whose every path
//!   segment is derived from container metadata via the name cipher.
//!
//! ## Storage Layout
//!
//! ```text
//! <storage root>/
//!   <encrypted container folder token>/
//!     <encrypted item token>.<ext>     # original extension in plaintext
//! ```
//!
//! Folder tokens are a pure function of the container's immutable fields
//! (`id`, whitespace-stripped `name`, `owner_user_id`) and its key, so they
//! are recomputed on demand by [`resolver::PathResolver`] and never stored.
//!
//! ## Write discipline
//!
//! Item rows are inserted with `pending` status before the disk write and
//! promoted to `committed` after it succeeds; only committed rows are
//! externally visible. Per-(container, filename) exclusivity is enforced by
//! the filesystem's atomic create-exclusive open, not by a pre-check.

pub mod containers;
pub mod db;
pub mod items;
pub mod ownership;
pub mod paths;
pub mod resolver;

use crate::crypto::CipherError;

pub use containers::{ContainerRegistry, ContainerSummary, StorageContainer};
pub use db::MetadataDb;
pub use items::{ItemEntry, ItemStatus, ItemStore, StorageContainerItem, UploadFile};
pub use ownership::OwnedResource;
pub use paths::StoragePaths;
pub use resolver::PathResolver;

/// Error type for container/item storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Referenced container, item, or backing file is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// A live file with the same derived name already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not the owner of the touched resource
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed request input
    #[error("validation error: {0}")]
    Validation(String),

    /// Disk I/O failure
    #[error("storage fault: {0}")]
    Io(#[from] std::io::Error),

    /// Name cipher failure (corrupt token or key mismatch)
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// System RNG refused to produce key material
    #[error("key generation failed")]
    KeyGeneration,

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
