//! App Manifest Service: serves the discovery document mini-app hosts fetch
//! before embedding the app.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::header,
    response::IntoResponse,
    routing::get,
};
use castpos_types::{
    AppManifest,
    constants::{MANIFEST_MAX_AGE_SECS, MANIFEST_PATH},
};
use tower_http::cors::{Any, CorsLayer};

use crate::settings::Settings;

/// Build the discovery document for a deployment
pub fn build_manifest(settings: &Settings) -> AppManifest {
    AppManifest::new(
        settings.app_url.as_str(),
        settings.account_association.clone(),
    )
}

async fn manifest_handler(Extension(manifest): Extension<Arc<AppManifest>>) -> impl IntoResponse {
    (
        [(
            header::CACHE_CONTROL,
            format!("public, max-age={MANIFEST_MAX_AGE_SECS}"),
        )],
        Json(manifest.as_ref().clone()),
    )
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "castpos-manifest"
    }))
}

pub fn create_router(manifest: AppManifest) -> Router<()> {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(MANIFEST_PATH, get(manifest_handler))
        .route("/health", get(health_handler))
        .layer(Extension(Arc::new(manifest)))
        .layer(cors_layer)
}

/// Serve the manifest on `binding_address:port` until the process stops
pub async fn start_server(
    manifest: AppManifest,
    binding_address: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(manifest);

    let addr = format!("{}:{}", binding_address, port);
    tracing::info!("Starting Cast-POS manifest service on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
