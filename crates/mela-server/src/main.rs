//! # mela-server
//!
//! REST backend for the Mela vendor marketplace.
//!
//! This binary provides:
//! - **Auth**: vendor registration, vendor/admin login, federated
//!   (Google) login, argon2id password storage, 7-day HS256 bearer
//!   tokens
//! - **Vendor profiles**: multi-step KYC profile editing, compliance
//!   document uploads, automatic trust-score recomputation
//! - **Products**: vendor-owned listings with image and catalogue
//!   uploads
//! - **Admin review**: KYC approve/reject and 0-5 trust ratings
//! - **Media storage**: filesystem-backed object store serving uploaded
//!   documents and images under `/media/`

mod api;
mod auth;
mod config;
mod error;
mod google;
mod media;
mod password;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::google::GoogleVerifier;
use crate::media::MediaStore;
use mela_store::{Database, Identity, Role, StoreError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mela_server=debug")),
        )
        .init();

    info!("Starting Mela vendor portal v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        media = %config.media_storage_path.display(),
        cors_any = config.allow_any_origin(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let database = Database::open_at(&config.database_path)?;
    seed_admin(&database, &config)?;

    let media = Arc::new(
        MediaStore::new(
            config.media_storage_path.clone(),
            config.max_upload_size,
            config.public_base_url.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("media store init: {e}"))?,
    );

    let tokens = TokenService::new(&config.jwt_secret);
    let google = GoogleVerifier::new(config.google_client_id.clone());

    let state = AppState {
        db: Arc::new(Mutex::new(database)),
        media,
        tokens,
        google,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Serve
    // -----------------------------------------------------------------------
    api::serve(state, config.http_addr).await
}

/// Seed the bootstrap admin identity when `ADMIN_EMAIL` / `ADMIN_PASSWORD`
/// are configured and no identity with that email exists yet.
fn seed_admin(db: &Database, config: &ServerConfig) -> anyhow::Result<()> {
    let (Some(email), Some(admin_password)) = (&config.admin_email, &config.admin_password)
    else {
        return Ok(());
    };

    match db.get_identity_by_email(email) {
        Ok(_) => return Ok(()),
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let password_hash = password::hash_password(admin_password)
        .map_err(|e| anyhow::anyhow!("admin password hash: {e}"))?;

    db.create_identity(&Identity {
        id: Uuid::new_v4(),
        name: "Admin".to_string(),
        email: email.clone(),
        password_hash: Some(password_hash),
        role: Role::Admin,
        google_sub: None,
        created_at: Utc::now(),
    })?;

    info!(email = %email, "seeded bootstrap admin identity");
    Ok(())
}
