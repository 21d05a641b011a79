// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Container metadata and the container registry.

use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::crypto::KeyService;

use super::db::MetadataDb;
use super::ownership::OwnedResource;
use super::resolver::PathResolver;
use super::{StorageError, StorageResult};

/// A user-owned storage container.
///
/// The encryption key is generated exactly once at creation and never
/// changes; every derived path for the container and its items hangs off
/// it. Rows are serialized as JSON into the metadata database and the key
/// never leaves the storage layer (API responses use summaries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageContainer {
    /// Unique container identifier (UUID)
    pub id: String,
    /// User who owns this container
    pub owner_user_id: String,
    /// Human-readable name, immutable after creation
    pub name: String,
    /// Base64-encoded 256-bit key
    pub encryption_key: String,
    /// When the container was created
    pub created_at: DateTime<Utc>,
    /// When the container was last modified
    pub updated_at: Option<DateTime<Utc>>,
}

impl StorageContainer {
    pub fn new(owner_user_id: String, name: String, encryption_key: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_user_id,
            name,
            encryption_key,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

impl OwnedResource for StorageContainer {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }
}

/// Container view returned to API clients (never includes the key).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContainerSummary {
    /// Unique container identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// When the container was created
    pub created_at: DateTime<Utc>,
    /// When the container was last modified
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<StorageContainer> for ContainerSummary {
    fn from(container: StorageContainer) -> Self {
        Self {
            id: container.id,
            name: container.name,
            created_at: container.created_at,
            updated_at: container.updated_at,
        }
    }
}

/// Registry of container metadata, constructed per operation.
pub struct ContainerRegistry<'a> {
    db: &'a MetadataDb,
    keys: &'a KeyService,
    resolver: PathResolver<'a>,
}

impl<'a> ContainerRegistry<'a> {
    pub fn new(db: &'a MetadataDb, keys: &'a KeyService, resolver: PathResolver<'a>) -> Self {
        Self { db, keys, resolver }
    }

    /// Create a container for the caller and its backing directory.
    ///
    /// The metadata row commits before the directory is created. If the
    /// directory creation then fails, the row stays behind without a
    /// backing folder; the upload path re-creates the directory, so such a
    /// container heals on first use.
    pub fn create(&self, user: &AuthenticatedUser, name: &str) -> StorageResult<StorageContainer> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation(
                "container name must not be empty".to_string(),
            ));
        }

        let key = self
            .keys
            .generate_key()
            .map_err(|_| StorageError::KeyGeneration)?;
        let container = StorageContainer::new(user.user_id.clone(), name.to_string(), key);
        self.db.insert_container(&container)?;

        let dir = self.resolver.container_dir(&container);
        fs::create_dir_all(&dir)?;

        tracing::info!(container_id = %container.id, "created storage container");
        Ok(container)
    }

    /// List the caller's containers.
    pub fn list_for_owner(
        &self,
        user: &AuthenticatedUser,
    ) -> StorageResult<Vec<StorageContainer>> {
        self.db.list_containers_by_owner(&user.user_id)
    }

    /// Fetch a container by id.
    pub fn get(&self, container_id: &str) -> StorageResult<StorageContainer> {
        self.db
            .get_container(container_id)?
            .ok_or_else(|| StorageError::NotFound(format!("container {container_id}")))
    }
}
