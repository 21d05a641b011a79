// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Container management API endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ContainerListResponse, CreateContainerRequest, StatusResponse},
    state::AppState,
    storage::ContainerSummary,
};

/// Create a new storage container for the authenticated user.
///
/// Generates the container's encryption key and its derived on-disk folder.
/// The key never appears in any response.
#[utoipa::path(
    post,
    path = "/v1/containers",
    tag = "Containers",
    security(("bearer_auth" = [])),
    request_body = CreateContainerRequest,
    responses(
        (status = 201, description = "Container created", body = StatusResponse),
        (status = 400, description = "Invalid container name"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_container(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateContainerRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    state.containers().create(&user, &request.name)?;
    Ok((StatusCode::CREATED, Json(StatusResponse::ok())))
}

/// List the authenticated user's containers.
#[utoipa::path(
    get,
    path = "/v1/containers",
    tag = "Containers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Containers owned by the caller", body = ContainerListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_containers(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ContainerListResponse>, ApiError> {
    let containers = state
        .containers()
        .list_for_owner(&user)?
        .into_iter()
        .map(ContainerSummary::from)
        .collect();

    Ok(Json(ContainerListResponse {
        success: true,
        containers,
    }))
}
