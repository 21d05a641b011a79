// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `STORAGE_ROOT` | Root directory for stored files | `storage` |
//! | `DATABASE_PATH` | Path of the redb metadata database | `data/coffer.redb` |
//! | `JWT_SECRET` | HS256 signing secret shared with the identity service | Required |
//! | `JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use crate::state::AuthConfig;

/// Environment variable name for the stored-files root directory.
pub const STORAGE_ROOT_ENV: &str = "STORAGE_ROOT";

/// Environment variable name for the metadata database path.
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage_root: PathBuf,
    pub database_path: PathBuf,
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Panics when `JWT_SECRET` is missing; the service must never start
    /// without a way to verify tokens.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let storage_root = env::var(STORAGE_ROOT_ENV)
            .unwrap_or_else(|_| crate::storage::paths::STORAGE_ROOT.to_string())
            .into();
        let database_path = env::var(DATABASE_PATH_ENV)
            .unwrap_or_else(|_| "data/coffer.redb".to_string())
            .into();

        let auth = AuthConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            issuer: env::var("JWT_ISSUER").ok(),
            audience: env::var("JWT_AUDIENCE").ok(),
        };

        Self {
            host,
            port,
            storage_root,
            database_path,
            auth,
        }
    }
}
