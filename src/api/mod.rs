// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{ContainerListResponse, CreateContainerRequest, ItemListResponse, StatusResponse},
    state::AppState,
    storage::{ContainerSummary, ItemEntry},
};

pub mod containers;
pub mod health;
pub mod items;

/// Upper bound on a multipart upload request body.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/containers",
            get(containers::list_containers).post(containers::create_container),
        )
        .route(
            "/containers/{container_id}/items",
            get(items::list_items).post(items::upload_items),
        )
        .route(
            "/items/{item_id}",
            get(items::download_item).delete(items::delete_item),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        containers::create_container,
        containers::list_containers,
        items::upload_items,
        items::list_items,
        items::download_item,
        items::delete_item
    ),
    components(
        schemas(
            CreateContainerRequest,
            StatusResponse,
            ContainerListResponse,
            ItemListResponse,
            ContainerSummary,
            ItemEntry,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Containers", description = "Container management"),
        (name = "Items", description = "File upload, listing, download and deletion"),
        (name = "Health", description = "Service liveness")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
