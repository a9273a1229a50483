//! Vendor profile and document endpoints.

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::ServerError;
use crate::media::MediaCategory;
use mela_store::{Address, DocumentKind, ProfileUpdate, VendorRecord};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateResponse {
    message: &'static str,
    vendor: VendorRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadResponse {
    message: &'static str,
    document_url: String,
    trust_score: u8,
}

/// GET /api/vendors/profile
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VendorRecord>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    claims.require_vendor()?;

    let vendor = state.db()?.get_vendor_by_identity(claims.sub)?;
    Ok(Json(vendor))
}

/// PUT /api/vendors/profile
///
/// Multipart: whitelisted text fields plus optional `gstFile` / `panFile`
/// certificate uploads.  Unknown fields are ignored.  Files are stored
/// before any record write, so a storage failure leaves the vendor
/// record untouched.
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ProfileUpdateResponse>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    claims.require_vendor()?;

    let current = state.db()?.get_vendor_by_identity(claims.sub)?;

    let mut update = ProfileUpdate::default();
    let mut address = current.address.clone();
    let mut address_touched = false;
    let mut bank = current.bank_details.clone();
    let mut bank_touched = false;
    let mut documents: Vec<(DocumentKind, String)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            // Certificate uploads ride along with the profile form.
            "gstFile" | "panFile" => {
                let kind = if name == "gstFile" {
                    DocumentKind::GstCert
                } else {
                    DocumentKind::PanCard
                };
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                let url = state
                    .media
                    .put(MediaCategory::Documents, file_name.as_deref(), &data)
                    .await?;
                documents.push((kind, url));
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                match name.as_str() {
                    "companyName" => update.company_name = Some(value),
                    "description" => update.description = Some(value),
                    "gstNumber" => update.gst_number = Some(value),
                    "panNumber" => update.pan_number = Some(value),
                    "cin" => update.cin = Some(value),
                    "entityType" => update.entity_type = Some(value),
                    "promoterNames" => update.promoter_names = Some(value),
                    "phone" => update.phone = Some(value),
                    "altPhone" => update.alt_phone = Some(value),
                    "spocName" => update.spoc_name = Some(value),
                    "accountNumber" => {
                        bank.account_number = value;
                        bank_touched = true;
                    }
                    "ifsc" => {
                        bank.ifsc = value;
                        bank_touched = true;
                    }
                    "street" => {
                        address.street = value;
                        address_touched = true;
                    }
                    "city" => {
                        address.city = value;
                        address_touched = true;
                    }
                    "state" => {
                        address.state = value;
                        address_touched = true;
                    }
                    "postalCode" | "pincode" => {
                        address.postal_code = value;
                        address_touched = true;
                    }
                    // Legacy clients send one flat address line; normalize
                    // it into the structured shape.
                    "address" => {
                        address = Address::from_flat(&value);
                        address_touched = true;
                    }
                    _ => {}
                }
            }
        }
    }

    if address_touched {
        update.address = Some(address);
    }
    if bank_touched {
        update.bank_details = Some(bank);
    }

    // A form carrying no recognized fields or files changes nothing; the
    // score and review state stay as they are.
    if update.is_empty() && documents.is_empty() {
        return Ok(Json(ProfileUpdateResponse {
            message: "Profile updated successfully",
            vendor: current,
        }));
    }

    let vendor = {
        let db = state.db()?;
        let mut vendor = db.update_vendor_profile(current.id, &update)?;
        for (kind, url) in &documents {
            vendor = db.attach_vendor_document(current.id, *kind, url)?;
        }
        vendor
    };

    info!(vendor_id = %vendor.id, trust_score = vendor.trust_score, "profile updated");

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully",
        vendor,
    }))
}

/// POST /api/vendors/upload-document
///
/// Multipart: a `type` field naming the document slot and a `file`
/// payload.  The record is only mutated after the object store confirms
/// the locator; the response carries the recomputed trust score.
pub async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<DocumentUploadResponse>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    claims.require_vendor()?;

    let vendor = state.db()?.get_vendor_by_identity(claims.sub)?;

    let mut kind: Option<DocumentKind> = None;
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name().unwrap_or("") {
            "type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                kind = Some(
                    DocumentKind::from_str(&value)
                        .map_err(|e| ServerError::Validation(e.to_string()))?,
                );
            }
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                file = Some((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| {
        ServerError::Validation("Missing 'type' field in multipart form".to_string())
    })?;
    let (file_name, data) = file.ok_or_else(|| {
        ServerError::Validation("No file received".to_string())
    })?;

    let url = state
        .media
        .put(MediaCategory::Documents, file_name.as_deref(), &data)
        .await?;

    let updated = state.db()?.attach_vendor_document(vendor.id, kind, &url)?;

    info!(
        vendor_id = %vendor.id,
        kind = %kind,
        trust_score = updated.trust_score,
        "document uploaded"
    );

    Ok(Json(DocumentUploadResponse {
        message: "Document uploaded successfully",
        document_url: url,
        trust_score: updated.trust_score,
    }))
}

/// GET /api/vendors — public listing.
pub async fn list_vendors(
    State(state): State<AppState>,
) -> Result<Json<Vec<VendorRecord>>, ServerError> {
    let vendors = state.db()?.list_vendors()?;
    Ok(Json(vendors))
}

/// GET /api/vendors/:id — public single record.
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorRecord>, ServerError> {
    let vendor = state
        .db()?
        .get_vendor(id)
        .map_err(|e| match e {
            mela_store::StoreError::NotFound => {
                ServerError::NotFound("Vendor not found".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(vendor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::config::ServerConfig;
    use crate::google::GoogleVerifier;
    use crate::media::MediaStore;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{HeaderValue, Request};
    use chrono::Utc;
    use mela_store::{Database, Identity, KycStatus, Role};
    use std::sync::{Arc, Mutex};

    async fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(
            dir.path().to_path_buf(),
            1024 * 1024,
            "http://localhost:5000".to_string(),
        )
        .await
        .unwrap();
        let state = AppState {
            db: Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
            media: Arc::new(media),
            tokens: TokenService::new("test-secret"),
            google: GoogleVerifier::new(None),
            config: Arc::new(ServerConfig::default()),
        };
        (dir, state)
    }

    fn seed_vendor(state: &AppState, email: &str) -> (VendorRecord, HeaderMap) {
        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: email.into(),
            password_hash: None,
            role: Role::Vendor,
            google_sub: None,
            created_at: Utc::now(),
        };
        let vendor = VendorRecord::new(identity.id, "Asha", email);
        {
            let db = state.db().unwrap();
            db.create_identity(&identity).unwrap();
            db.create_vendor(&vendor).unwrap();
        }

        let token = state.tokens.issue(identity.id, Role::Vendor).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        (vendor, headers)
    }

    async fn form(fields: &[(&str, &str)]) -> Multipart {
        let boundary = "form-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        let request = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn empty_form_leaves_review_state_untouched() {
        let (_dir, state) = test_state().await;
        let (vendor, headers) = seed_vendor(&state, "asha@example.com");
        state
            .db()
            .unwrap()
            .set_kyc_status(vendor.id, KycStatus::Approved)
            .unwrap();

        let multipart = form(&[("unknownField", "ignored")]).await;
        let response = update_profile(State(state.clone()), headers, multipart)
            .await
            .unwrap();
        assert_eq!(response.0.vendor.kyc_status, KycStatus::Approved);

        let stored = state.db().unwrap().get_vendor(vendor.id).unwrap();
        assert_eq!(stored.kyc_status, KycStatus::Approved);
    }

    #[tokio::test]
    async fn recognized_field_rescores_and_resets_kyc() {
        let (_dir, state) = test_state().await;
        let (vendor, headers) = seed_vendor(&state, "asha@example.com");
        state
            .db()
            .unwrap()
            .set_kyc_status(vendor.id, KycStatus::Approved)
            .unwrap();

        let multipart = form(&[("companyName", "Asha Traders")]).await;
        let response = update_profile(State(state.clone()), headers, multipart)
            .await
            .unwrap();
        assert_eq!(response.0.vendor.company_name, "Asha Traders");
        assert_eq!(response.0.vendor.kyc_status, KycStatus::Pending);
        // email 10 + company 10
        assert_eq!(response.0.vendor.trust_score, 20);
    }
}
