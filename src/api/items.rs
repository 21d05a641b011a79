// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Item API endpoints: multipart upload, listing, download, deletion.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ItemListResponse, StatusResponse},
    state::AppState,
    storage::UploadFile,
};

/// Upload one or more files into a container.
///
/// Files are sent as `files` fields of a multipart form. Zero-length files
/// are skipped; a name collision aborts the batch with `409`.
#[utoipa::path(
    post,
    path = "/v1/containers/{container_id}/items",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("container_id" = String, Path, description = "Container to upload into")),
    responses(
        (status = 200, description = "Files stored", body = StatusResponse),
        (status = 400, description = "Missing container or no files"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A file with the same name already exists")
    )
)]
pub async fn upload_items(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if !matches!(field.name(), Some("files" | "file")) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
            .to_vec();

        files.push(UploadFile { file_name, bytes });
    }

    state.items().upload(&user, &container_id, files)?;
    Ok(Json(StatusResponse::ok()))
}

/// List a container's items with decrypted file names.
#[utoipa::path(
    get,
    path = "/v1/containers/{container_id}/items",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("container_id" = String, Path, description = "Container to list")),
    responses(
        (status = 200, description = "Items in the container", body = ItemListResponse),
        (status = 400, description = "Missing container"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_items(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(container_id): Path<String>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let (container, items) = state.items().list(&user, &container_id)?;

    Ok(Json(ItemListResponse {
        success: true,
        items,
        container: container.into(),
    }))
}

/// Download an item.
///
/// Returns the raw bytes with the decrypted file name in the
/// `Content-Disposition` header and a content type guessed from the
/// plaintext extension.
#[utoipa::path(
    get,
    path = "/v1/items/{item_id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("item_id" = String, Path, description = "Item to download")),
    responses(
        (status = 200, description = "File content with the decrypted name in Content-Disposition"),
        (status = 400, description = "Missing item, container, or file"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn download_item(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Response, ApiError> {
    let (file_name, bytes) = state.items().download(&user, &item_id)?;

    let mime_type = mime_guess::from_path(&file_name)
        .first_or_octet_stream()
        .to_string();
    let disposition = format!("attachment; filename=\"{file_name}\"");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Delete an item's file and metadata.
#[utoipa::path(
    delete,
    path = "/v1/items/{item_id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("item_id" = String, Path, description = "Item to delete")),
    responses(
        (status = 200, description = "Item deleted", body = StatusResponse),
        (status = 400, description = "Missing item or file"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete_item(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.items().delete(&user, &item_id)?;
    Ok(Json(StatusResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::AuthConfig;
    use crate::storage::{MetadataDb, StoragePaths};

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = MetadataDb::open(&dir.path().join("meta.redb")).unwrap();
        let paths = StoragePaths::new(dir.path().join("files"));
        let state = AppState::new(
            db,
            paths,
            AuthConfig {
                secret: "secret".to_string(),
                issuer: None,
                audience: None,
            },
        );
        (state, dir)
    }

    #[tokio::test]
    async fn list_items_returns_container_summary() {
        let (state, _dir) = test_state();
        let user = AuthenticatedUser::new("user_a");
        let container = state.containers().create(&user, "Docs").unwrap();

        state
            .items()
            .upload(
                &user,
                &container.id,
                vec![UploadFile {
                    file_name: "a.txt".to_string(),
                    bytes: b"abc".to_vec(),
                }],
            )
            .unwrap();

        let Json(response) = list_items(
            Auth(user),
            State(state),
            Path(container.id.clone()),
        )
        .await
        .expect("listing succeeds");

        assert!(response.success);
        assert_eq!(response.container.id, container.id);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].file_name, "a.txt");
        assert_eq!(response.items[0].size, 3);
    }

    #[tokio::test]
    async fn download_sets_name_and_content_type() {
        let (state, _dir) = test_state();
        let user = AuthenticatedUser::new("user_a");
        let container = state.containers().create(&user, "Pics").unwrap();
        state
            .items()
            .upload(
                &user,
                &container.id,
                vec![UploadFile {
                    file_name: "cat.png".to_string(),
                    bytes: b"0123456789".to_vec(),
                }],
            )
            .unwrap();
        let (_, entries) = state.items().list(&user, &container.id).unwrap();

        let response = download_item(
            Auth(user),
            State(state),
            Path(entries[0].id.clone()),
        )
        .await
        .expect("download succeeds");

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE.as_str()], "image/png");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION.as_str()],
            "attachment; filename=\"cat.png\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"0123456789");
    }

    #[tokio::test]
    async fn delete_missing_item_is_bad_request() {
        let (state, _dir) = test_state();
        let user = AuthenticatedUser::new("user_a");

        let err = delete_item(Auth(user), State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
