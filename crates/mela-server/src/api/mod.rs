//! HTTP API: router assembly, shared state, and the handful of routes
//! that do not belong to a resource module.

pub mod admin;
pub mod auth;
pub mod products;
pub mod vendors;

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::google::GoogleVerifier;
use crate::media::{MediaCategory, MediaStore};
use mela_store::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub media: Arc<MediaStore>,
    pub tokens: TokenService,
    pub google: GoogleVerifier,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Lock the database handle.  A poisoned lock means a handler
    /// panicked mid-write; surface that as an internal error instead of
    /// propagating the panic.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ServerError> {
        self.db
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/admin/login", post(auth::admin_login))
        .route("/api/auth/google-login", post(auth::google_login))
        // Vendors
        .route(
            "/api/vendors/profile",
            get(vendors::get_profile).put(vendors::update_profile),
        )
        .route("/api/vendors/upload-document", post(vendors::upload_document))
        .route("/api/vendors", get(vendors::list_vendors))
        .route("/api/vendors/:id", get(vendors::get_vendor))
        // Products
        .route(
            "/api/products",
            get(products::list_my_products).post(products::create_product),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        // Admin
        .route("/api/admin/vendors", get(admin::list_vendors))
        .route("/api/admin/vendors/:id", get(admin::get_vendor))
        .route("/api/admin/vendors/:id/products", get(admin::list_vendor_products))
        .route("/api/admin/vendors/:id/kyc", put(admin::update_kyc))
        .route("/api/admin/vendors/:id/rate", put(admin::rate_vendor))
        // Stored media objects
        .route("/media/:category/:file", get(media_download))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    if config.allow_any_origin() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn root() -> &'static str {
    "Vendor Portal API running"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Serve a stored media object back to the client.
async fn media_download(
    State(state): State<AppState>,
    Path((category, file)): Path<(String, String)>,
) -> Result<Vec<u8>, ServerError> {
    let category = MediaCategory::from_str(&category)?;
    state.media.get(category, &file).await
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
