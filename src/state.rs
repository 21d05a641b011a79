// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Shared application state.
//!
//! Every component is an explicit constructed value hanging off
//! [`AppState`]; there is no hidden process-wide singleton. Handlers borrow
//! the pieces they need through the per-operation service constructors.

use std::sync::Arc;

use crate::crypto::KeyService;
use crate::storage::{ContainerRegistry, ItemStore, MetadataDb, PathResolver, StoragePaths};

/// Bearer-token validation settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the identity service.
    pub secret: String,
    /// Expected `iss` claim; unchecked when absent.
    pub issuer: Option<String>,
    /// Expected `aud` claim; unchecked when absent.
    pub audience: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<MetadataDb>,
    paths: StoragePaths,
    keys: Arc<KeyService>,
    auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(db: MetadataDb, paths: StoragePaths, auth: AuthConfig) -> Self {
        Self {
            db: Arc::new(db),
            paths,
            keys: Arc::new(KeyService::new()),
            auth: Arc::new(auth),
        }
    }

    pub fn db(&self) -> &MetadataDb {
        &self.db
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Container registry for one operation.
    pub fn containers(&self) -> ContainerRegistry<'_> {
        ContainerRegistry::new(&self.db, &self.keys, PathResolver::new(&self.paths))
    }

    /// Item store for one operation.
    pub fn items(&self) -> ItemStore<'_> {
        ItemStore::new(&self.db, PathResolver::new(&self.paths))
    }
}
