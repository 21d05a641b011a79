// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! JWT claims and the authenticated user capability.

use serde::{Deserialize, Serialize};

/// Claims expected inside a bearer token.
///
/// Only `sub` is required; issuer/audience/expiry are enforced by the
/// `jsonwebtoken` validation rather than read off this struct.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    /// Subject - the canonical user identifier
    pub sub: String,

    /// Expiration timestamp (validated by the decoder, kept for serde)
    #[serde(default)]
    #[allow(dead_code)]
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    #[allow(dead_code)]
    pub iat: i64,

    /// Issuer
    #[serde(default)]
    #[allow(dead_code)]
    pub iss: String,

    /// Audience (validated by the decoder, not read directly)
    #[serde(default)]
    #[allow(dead_code)]
    pub aud: Option<serde_json::Value>,

    /// Email address, if the issuer includes one
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated caller identity extracted from a verified token.
///
/// This is the capability every storage operation takes; nothing below the
/// API layer ever sees the raw token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Canonical user ID (JWT `sub` claim)
    pub user_id: String,

    /// Email address, when present in the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }
}

impl From<JwtClaims> for AuthenticatedUser {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}
