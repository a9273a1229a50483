//! Admin review workflow: vendor listing, KYC decisions, trust ratings.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::auth::Claims;
use crate::error::ServerError;
use mela_core::trust::validate_rating;
use mela_store::{KycStatus, ProductRecord, StoreError, TrustReview, VendorRecord};

#[derive(Deserialize)]
pub struct KycRequest {
    status: String,
}

#[derive(Deserialize)]
pub struct RateRequest {
    /// Accepted as a JSON number so fractional values can be rejected
    /// explicitly rather than truncated.
    rating: f64,
}

#[derive(Serialize)]
pub struct RateResponse {
    message: &'static str,
    trust: TrustReview,
}

fn admin(state: &AppState, headers: &HeaderMap) -> Result<Claims, ServerError> {
    let claims = state.tokens.authenticate(headers)?;
    claims.require_admin()?;
    Ok(claims)
}

fn vendor_not_found(e: StoreError) -> ServerError {
    match e {
        StoreError::NotFound => ServerError::NotFound("Vendor not found".to_string()),
        other => other.into(),
    }
}

/// GET /api/admin/vendors
pub async fn list_vendors(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<VendorRecord>>, ServerError> {
    admin(&state, &headers)?;
    let vendors = state.db()?.list_vendors()?;
    Ok(Json(vendors))
}

/// GET /api/admin/vendors/:id
pub async fn get_vendor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorRecord>, ServerError> {
    admin(&state, &headers)?;
    let vendor = state.db()?.get_vendor(id).map_err(vendor_not_found)?;
    Ok(Json(vendor))
}

/// GET /api/admin/vendors/:id/products
pub async fn list_vendor_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProductRecord>>, ServerError> {
    admin(&state, &headers)?;
    let products = {
        let db = state.db()?;
        // 404 for an unknown vendor rather than an empty list.
        db.get_vendor(id).map_err(vendor_not_found)?;
        db.list_products_for_vendor(id)?
    };
    Ok(Json(products))
}

/// PUT /api/admin/vendors/:id/kyc
///
/// Sets the KYC status and nothing else.  An unknown status string is a
/// validation error with no mutation.
pub async fn update_kyc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<KycRequest>,
) -> Result<Json<VendorRecord>, ServerError> {
    let claims = admin(&state, &headers)?;

    let status = KycStatus::from_str(&req.status)
        .map_err(|e| ServerError::Validation(e.to_string()))?;

    let vendor = state
        .db()?
        .set_kyc_status(id, status)
        .map_err(vendor_not_found)?;

    info!(vendor_id = %id, status = %status, admin = %claims.sub, "KYC decision recorded");

    Ok(Json(vendor))
}

/// PUT /api/admin/vendors/:id/rate
///
/// Stores an integer trust rating in [0, 5] along with the acting admin
/// and timestamp.  Independent of KYC status.
pub async fn rate_vendor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<RateRequest>,
) -> Result<Json<RateResponse>, ServerError> {
    let claims = admin(&state, &headers)?;

    let rating = validate_rating(req.rating).ok_or_else(|| {
        ServerError::Validation("Rating must be an integer between 0 and 5".to_string())
    })?;

    let vendor = state
        .db()?
        .rate_vendor(id, rating, claims.sub)
        .map_err(vendor_not_found)?;

    info!(vendor_id = %id, rating, admin = %claims.sub, "vendor rated");

    Ok(Json(RateResponse {
        message: "Vendor rated successfully",
        trust: vendor.trust,
    }))
}
