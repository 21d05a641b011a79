// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::claims::JwtClaims;
use super::{AuthenticatedUser, AuthError};
use crate::state::{AppState, AuthConfig};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extractor that validates the bearer token from the Authorization header
/// and provides the authenticated user to the handler.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_containers(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<ContainerListResponse>, ApiError> {
///     // user.user_id is the verified caller identity
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?
            .trim();

        let user = verify_token(token, state.auth())?;
        Ok(Auth(user))
    }
}

/// Verify an HS256 token against the configured secret and extract the
/// caller identity.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }

    if let Some(ref audience) = config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        _ => AuthError::MalformedToken,
    })?;

    Ok(AuthenticatedUser::from(token_data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, AuthConfig};
    use crate::storage::{MetadataDb, StoragePaths};
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-signing-secret";

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = MetadataDb::open(&dir.path().join("meta.redb")).unwrap();
        let paths = StoragePaths::new(dir.path().join("files"));
        let state = AppState::new(
            db,
            paths,
            AuthConfig {
                secret: SECRET.to_string(),
                issuer: None,
                audience: None,
            },
        );
        (state, dir)
    }

    fn make_token(secret: &str, sub: &str, exp: i64) -> String {
        let claims = serde_json::json!({
            "sub": sub,
            "iat": 1700000000i64,
            "exp": exp,
            "iss": "test-issuer",
            "email": "user@example.com",
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn extractor_rejects_missing_header() {
        let (state, _dir) = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn extractor_rejects_non_bearer_header() {
        let (state, _dir) = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn extractor_accepts_valid_token() {
        let (state, _dir) = test_state();
        let token = make_token(SECRET, "user_123", 9999999999);
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = AuthConfig {
            secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        };
        let token = make_token("some-other-secret", "user_123", 9999999999);

        let result = verify_token(&token, &config);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig {
            secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        };
        let token = make_token(SECRET, "user_123", 1700000000);

        let result = verify_token(&token, &config);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn issuer_mismatch_is_rejected() {
        let config = AuthConfig {
            secret: SECRET.to_string(),
            issuer: Some("expected-issuer".to_string()),
            audience: None,
        };
        let token = make_token(SECRET, "user_123", 9999999999);

        let result = verify_token(&token, &config);
        assert!(matches!(result, Err(AuthError::InvalidIssuer)));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let config = AuthConfig {
            secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        };
        let result = verify_token("definitely.not.a-jwt", &config);
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }
}
