//! Product listing endpoints.
//!
//! All routes require a bearer token.  Vendors only see and mutate their
//! own listings; admins may read and delete any listing but never edit
//! one.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::auth::Claims;
use crate::error::ServerError;
use crate::media::MediaCategory;
use mela_store::{ProductKind, ProductRecord, StoreError, VendorRecord};

/// Upper bound on images per listing, matching the upload form.
const MAX_IMAGES: usize = 5;

#[derive(Serialize)]
pub struct DeletedResponse {
    message: &'static str,
}

/// Text fields and buffered file payloads drained from a product
/// multipart form.  Buffering first lets us validate everything before
/// any object is stored.
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    kind: Option<ProductKind>,
    description: Option<String>,
    specifications: Option<String>,
    price: Option<f64>,
    images: Vec<(Option<String>, Vec<u8>)>,
    catalogue: Option<(Option<String>, Vec<u8>)>,
}

async fn drain_form(multipart: &mut Multipart) -> Result<ProductForm, ServerError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "images" => {
                if form.images.len() >= MAX_IMAGES {
                    return Err(ServerError::Validation(format!(
                        "At most {MAX_IMAGES} images per listing"
                    )));
                }
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                form.images.push((file_name, data.to_vec()));
            }
            "catalogue" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                form.catalogue = Some((file_name, data.to_vec()));
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read field: {e}")))?;
                match name.as_str() {
                    "name" => form.name = Some(value),
                    "type" => {
                        form.kind = Some(
                            ProductKind::from_str(&value)
                                .map_err(|e| ServerError::Validation(e.to_string()))?,
                        )
                    }
                    "description" => form.description = Some(value),
                    "specifications" => form.specifications = Some(value),
                    "price" => {
                        let price: f64 = value.parse().map_err(|_| {
                            ServerError::Validation("Price must be a number".to_string())
                        })?;
                        if !price.is_finite() || price < 0.0 {
                            return Err(ServerError::Validation(
                                "Price must be non-negative".to_string(),
                            ));
                        }
                        form.price = Some(price);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Store the buffered image payloads one at a time.
///
/// A mid-batch failure aborts the remaining uploads and surfaces to the
/// caller; objects already stored are not rolled back.
async fn store_images(
    state: &AppState,
    images: &[(Option<String>, Vec<u8>)],
) -> Result<Vec<String>, ServerError> {
    let mut locators = Vec::with_capacity(images.len());
    for (file_name, data) in images {
        let url = state
            .media
            .put(MediaCategory::Images, file_name.as_deref(), data)
            .await?;
        locators.push(url);
    }
    Ok(locators)
}

fn resolve_vendor(state: &AppState, claims: &Claims) -> Result<VendorRecord, ServerError> {
    claims.require_vendor()?;
    Ok(state.db()?.get_vendor_by_identity(claims.sub)?)
}

fn product_not_found(e: StoreError) -> ServerError {
    match e {
        StoreError::NotFound => ServerError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

/// Owner check: the requesting vendor must own the product, unless the
/// principal is an admin (read/delete paths).
fn check_access(
    state: &AppState,
    claims: &Claims,
    product: &ProductRecord,
) -> Result<(), ServerError> {
    if claims.is_admin {
        return Ok(());
    }
    let vendor = state.db()?.get_vendor_by_identity(claims.sub)?;
    if vendor.id == product.vendor_id {
        Ok(())
    } else {
        Err(ServerError::Forbidden("Access denied".to_string()))
    }
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProductRecord>), ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    let vendor = resolve_vendor(&state, &claims)?;

    let form = drain_form(&mut multipart).await?;
    let name = form
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServerError::Validation("Product name is required".to_string()))?;
    let kind = form
        .kind
        .ok_or_else(|| ServerError::Validation("Product type is required".to_string()))?;
    let price = form
        .price
        .ok_or_else(|| ServerError::Validation("Price is required".to_string()))?;

    let images = store_images(&state, &form.images).await?;
    let catalogue = match &form.catalogue {
        Some((file_name, data)) => {
            state
                .media
                .put(MediaCategory::Catalogues, file_name.as_deref(), data)
                .await?
        }
        None => String::new(),
    };

    let now = Utc::now();
    let product = ProductRecord {
        id: Uuid::new_v4(),
        vendor_id: vendor.id,
        name,
        kind,
        description: form.description.unwrap_or_default(),
        specifications: form.specifications.unwrap_or_default(),
        price,
        images,
        catalogue,
        created_at: now,
        updated_at: now,
    };
    state.db()?.create_product(&product)?;

    info!(product_id = %product.id, vendor_id = %vendor.id, "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/:id
///
/// Fields are optional; supplied ones overwrite.  New images replace the
/// whole set and the displaced locators are deleted best-effort, as is a
/// replaced catalogue.
pub async fn update_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ProductRecord>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    let vendor = resolve_vendor(&state, &claims)?;

    let mut product = state.db()?.get_product(id).map_err(product_not_found)?;
    if product.vendor_id != vendor.id {
        return Err(ServerError::Forbidden("Access denied".to_string()));
    }

    let form = drain_form(&mut multipart).await?;

    if let Some(name) = form.name {
        if name.is_empty() {
            return Err(ServerError::Validation(
                "Product name cannot be empty".to_string(),
            ));
        }
        product.name = name;
    }
    if let Some(kind) = form.kind {
        product.kind = kind;
    }
    if let Some(description) = form.description {
        product.description = description;
    }
    if let Some(specifications) = form.specifications {
        product.specifications = specifications;
    }
    if let Some(price) = form.price {
        product.price = price;
    }

    if !form.images.is_empty() {
        let new_images = store_images(&state, &form.images).await?;
        let old_images = std::mem::replace(&mut product.images, new_images);
        for locator in &old_images {
            state.media.delete_by_locator(locator).await;
        }
    }

    if let Some((file_name, data)) = &form.catalogue {
        let new_catalogue = state
            .media
            .put(MediaCategory::Catalogues, file_name.as_deref(), data)
            .await?;
        let old = std::mem::replace(&mut product.catalogue, new_catalogue);
        if !old.is_empty() {
            state.media.delete_by_locator(&old).await;
        }
    }

    state.db()?.update_product(&mut product)?;

    info!(product_id = %product.id, "product updated");

    Ok(Json(product))
}

/// GET /api/products — the requesting vendor's own listings.
pub async fn list_my_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductRecord>>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    let vendor = resolve_vendor(&state, &claims)?;

    let products = state.db()?.list_products_for_vendor(vendor.id)?;
    Ok(Json(products))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductRecord>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    let product = state.db()?.get_product(id).map_err(product_not_found)?;
    check_access(&state, &claims, &product)?;
    Ok(Json(product))
}

/// DELETE /api/products/:id — owning vendor or admin.  Deletion is
/// immediate and permanent.
pub async fn delete_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    let claims = state.tokens.authenticate(&headers)?;
    let product = state.db()?.get_product(id).map_err(product_not_found)?;
    check_access(&state, &claims, &product)?;

    state.db()?.delete_product(id)?;

    info!(product_id = %id, "product deleted");

    Ok(Json(DeletedResponse {
        message: "Product deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::config::ServerConfig;
    use crate::google::GoogleVerifier;
    use crate::media::MediaStore;
    use axum::http::HeaderValue;
    use mela_store::{Database, Identity, Role};
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

    fn seed_product(state: &AppState, vendor_id: Uuid) -> ProductRecord {
        let now = Utc::now();
        let product = ProductRecord {
            id: Uuid::new_v4(),
            vendor_id,
            name: "Fasteners".into(),
            kind: ProductKind::Product,
            description: String::new(),
            specifications: String::new(),
            price: 10.0,
            images: Vec::new(),
            catalogue: String::new(),
            created_at: now,
            updated_at: now,
        };
        state.db().unwrap().create_product(&product).unwrap();
        product
    }

    #[tokio::test]
    async fn cross_vendor_read_is_forbidden() {
        let (_dir, state) = test_state().await;
        let (owner, _) = seed_vendor(&state, "owner@example.com");
        let (_, other_headers) = seed_vendor(&state, "other@example.com");
        let product = seed_product(&state, owner.id);

        let result = get_product(State(state.clone()), other_headers, Path(product.id)).await;
        assert!(matches!(result, Err(ServerError::Forbidden(_))));
    }

    #[tokio::test]
    async fn cross_vendor_delete_is_forbidden_and_record_survives() {
        let (_dir, state) = test_state().await;
        let (owner, owner_headers) = seed_vendor(&state, "owner@example.com");
        let (_, other_headers) = seed_vendor(&state, "other@example.com");
        let product = seed_product(&state, owner.id);

        let result =
            delete_product(State(state.clone()), other_headers, Path(product.id)).await;
        assert!(matches!(result, Err(ServerError::Forbidden(_))));

        // Denied delete leaves the record fully intact for its owner.
        let fetched = get_product(State(state.clone()), owner_headers, Path(product.id))
            .await
            .unwrap();
        assert_eq!(fetched.0.id, product.id);
    }
}
