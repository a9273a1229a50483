//! Registration and login endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::ServerError;
use crate::password::{hash_password, verify_password};
use mela_store::{Identity, Role, StoreError, VendorRecord};

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    message: &'static str,
    vendor_id: Uuid,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    token: String,
    role: Role,
    vendor_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    id: Uuid,
    name: String,
    role: Role,
}

#[derive(Serialize)]
pub struct AdminLoginResponse {
    token: String,
    user: UserSummary,
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginResponse {
    token: String,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor_id: Option<Uuid>,
    user: UserSummary,
}

/// POST /api/auth/register
///
/// Creates the Identity and its VendorRecord.  The two writes are not
/// transactional; if the vendor write fails the identity is deleted as a
/// compensation step so the email is not left burned.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ServerError> {
    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(ServerError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let identity = Identity {
        id: Uuid::new_v4(),
        name: req.name.clone(),
        email: req.email.clone(),
        password_hash: Some(password_hash),
        role: Role::Vendor,
        google_sub: None,
        created_at: Utc::now(),
    };
    let vendor = VendorRecord::new(identity.id, &req.name, &req.email);

    {
        let db = state.db()?;
        db.create_identity(&identity)?;
        if let Err(e) = db.create_vendor(&vendor) {
            // Compensation: do not leave a credential-bearing identity
            // without its vendor record.
            if let Err(del) = db.delete_identity(identity.id) {
                tracing::error!(error = %del, "compensation delete failed after vendor create error");
            }
            return Err(e.into());
        }
    }

    info!(vendor_id = %vendor.id, "vendor registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Vendor registered successfully",
            vendor_id: vendor.id,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let (identity, vendor) = {
        let db = state.db()?;
        let identity = db
            .get_identity_by_email_and_role(&req.email, Role::Vendor)
            .map_err(invalid_credentials)?;
        let vendor = db.get_vendor_by_identity(identity.id)?;
        (identity, vendor)
    };

    check_password(&req.password, identity.password_hash.as_deref())?;

    let token = state.tokens.issue(identity.id, Role::Vendor)?;
    Ok(Json(LoginResponse {
        token,
        role: Role::Vendor,
        vendor_id: vendor.id,
    }))
}

/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AdminLoginResponse>, ServerError> {
    let identity = {
        let db = state.db()?;
        db.get_identity_by_email_and_role(&req.email, Role::Admin)
            .map_err(|e| match e {
                StoreError::NotFound => ServerError::NotFound("Admin not found".to_string()),
                other => other.into(),
            })?
    };

    check_password(&req.password, identity.password_hash.as_deref())?;

    let token = state.tokens.issue(identity.id, Role::Admin)?;
    Ok(Json(AdminLoginResponse {
        token,
        user: UserSummary {
            id: identity.id,
            name: identity.name,
            role: Role::Admin,
        },
    }))
}

/// POST /api/auth/google-login
///
/// First sight of an email provisions an Identity + VendorRecord pair
/// (no password; the federated subject id is recorded instead), with the
/// same compensation step as registration.
pub async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<Json<GoogleLoginResponse>, ServerError> {
    let claims = state.google.decode(&req.token)?;

    let db = state.db()?;
    let identity = match db.get_identity_by_email(&claims.email) {
        Ok(existing) => existing,
        Err(StoreError::NotFound) => {
            let name = if claims.name.is_empty() {
                claims.email.clone()
            } else {
                claims.name.clone()
            };
            let identity = Identity {
                id: Uuid::new_v4(),
                name: name.clone(),
                email: claims.email.clone(),
                password_hash: None,
                role: Role::Vendor,
                google_sub: Some(claims.sub.clone()),
                created_at: Utc::now(),
            };
            let vendor = VendorRecord::new(identity.id, &name, &claims.email);

            db.create_identity(&identity)?;
            if let Err(e) = db.create_vendor(&vendor) {
                if let Err(del) = db.delete_identity(identity.id) {
                    tracing::error!(error = %del, "compensation delete failed after vendor create error");
                }
                return Err(e.into());
            }
            info!(vendor_id = %vendor.id, "vendor provisioned via federated login");
            identity
        }
        Err(e) => return Err(e.into()),
    };

    let vendor_id = match identity.role {
        Role::Vendor => Some(db.get_vendor_by_identity(identity.id)?.id),
        Role::Admin => None,
    };
    drop(db);

    let token = state.tokens.issue(identity.id, identity.role)?;
    Ok(Json(GoogleLoginResponse {
        token,
        role: identity.role,
        vendor_id,
        user: UserSummary {
            id: identity.id,
            name: identity.name,
            role: identity.role,
        },
    }))
}

/// Verify a password attempt, treating a missing hash (federated-only
/// identity) as a mismatch.
fn check_password(attempt: &str, hash: Option<&str>) -> Result<(), ServerError> {
    let ok = hash.map(|h| verify_password(attempt, h)).unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(ServerError::Unauthorized("Invalid credentials".to_string()))
    }
}

/// Unknown email and wrong password must be indistinguishable.
fn invalid_credentials(e: StoreError) -> ServerError {
    match e {
        StoreError::NotFound => ServerError::Unauthorized("Invalid credentials".to_string()),
        other => other.into(),
    }
}
