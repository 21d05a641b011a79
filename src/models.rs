// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation. Successful responses carry a `success: true` flag so
//! clients can branch on one field regardless of operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{ContainerSummary, ItemEntry};

/// Request to create a new storage container.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateContainerRequest {
    /// Human-readable container name. Immutable after creation.
    pub name: String,
}

/// Generic success acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub success: bool,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Response listing the caller's containers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContainerListResponse {
    pub success: bool,
    /// Containers owned by the caller.
    pub containers: Vec<ContainerSummary>,
}

/// Response listing a container's items.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub success: bool,
    /// Items with decrypted display names.
    pub items: Vec<ItemEntry>,
    /// The container the items belong to.
    pub container: ContainerSummary,
}
