//! CRUD operations for [`ProductRecord`] listings.

use chrono::{DateTime, Utc};
use rusqlite::params;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::identities::conversion;
use mela_core::models::ProductRecord;
use mela_core::types::ProductKind;

const PRODUCT_COLUMNS: &str = "id, vendor_id, name, kind, description, specifications, \
     price, images, catalogue, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new product listing.
    pub fn create_product(&self, product: &ProductRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO products (id, vendor_id, name, kind, description, specifications,
                 price, images, catalogue, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                product.id.to_string(),
                product.vendor_id.to_string(),
                product.name,
                product.kind.as_str(),
                product.description,
                product.specifications,
                product.price,
                serde_json::to_string(&product.images)?,
                product.catalogue,
                product.created_at.to_rfc3339(),
                product.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single product by UUID.
    pub fn get_product(&self, id: Uuid) -> Result<ProductRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                params![id.to_string()],
                row_to_product,
            )
            .map_err(not_found)
    }

    /// List the products owned by one vendor, newest first.
    pub fn list_products_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ProductRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE vendor_id = ?1
             ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![vendor_id.to_string()], row_to_product)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist every mutable column of a product, bumping `updated_at`.
    pub fn update_product(&self, product: &mut ProductRecord) -> Result<()> {
        product.updated_at = Utc::now();
        let affected = self.conn().execute(
            "UPDATE products SET
                 name = ?2, kind = ?3, description = ?4, specifications = ?5,
                 price = ?6, images = ?7, catalogue = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                product.id.to_string(),
                product.name,
                product.kind.as_str(),
                product.description,
                product.specifications,
                product.price,
                serde_json::to_string(&product.images)?,
                product.catalogue,
                product.updated_at.to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a product by UUID.  Returns `true` if a row was deleted.
    pub fn delete_product(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM products WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`ProductRecord`].
fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRecord> {
    let id_str: String = row.get(0)?;
    let vendor_str: String = row.get(1)?;
    let kind_str: String = row.get(3)?;
    let images_json: String = row.get(7)?;
    let created_str: String = row.get(9)?;
    let updated_str: String = row.get(10)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion(0, e))?;
    let vendor_id = Uuid::parse_str(&vendor_str).map_err(|e| conversion(1, e))?;
    let kind = ProductKind::from_str(&kind_str).map_err(|e| conversion(3, e))?;
    let images: Vec<String> =
        serde_json::from_str(&images_json).map_err(|e| conversion(7, e))?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(9, e))?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(10, e))?;

    Ok(ProductRecord {
        id,
        vendor_id,
        name: row.get(2)?,
        kind,
        description: row.get(4)?,
        specifications: row.get(5)?,
        price: row.get(6)?,
        images,
        catalogue: row.get(8)?,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mela_core::models::{Identity, VendorRecord};
    use mela_core::types::Role;

    fn seeded_db() -> (Database, VendorRecord) {
        let db = Database::open_in_memory().unwrap();
        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: Some("$argon2id$test".into()),
            role: Role::Vendor,
            google_sub: None,
            created_at: Utc::now(),
        };
        db.create_identity(&identity).unwrap();
        let vendor = VendorRecord::new(identity.id, "Asha", "asha@example.com");
        db.create_vendor(&vendor).unwrap();
        (db, vendor)
    }

    fn listing(vendor_id: Uuid, name: &str) -> ProductRecord {
        let now = Utc::now();
        ProductRecord {
            id: Uuid::new_v4(),
            vendor_id,
            name: name.into(),
            kind: ProductKind::Product,
            description: "Steel fasteners".into(),
            specifications: "M8, zinc plated".into(),
            price: 499.0,
            images: vec!["https://m/products/images/a.jpg".into()],
            catalogue: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_and_fetch_round_trip() {
        let (db, vendor) = seeded_db();
        let product = listing(vendor.id, "Fasteners");
        db.create_product(&product).unwrap();

        let fetched = db.get_product(product.id).unwrap();
        assert_eq!(fetched, product);
    }

    #[test]
    fn list_scoped_to_vendor() {
        let (db, vendor) = seeded_db();
        db.create_product(&listing(vendor.id, "Fasteners")).unwrap();
        db.create_product(&listing(vendor.id, "Bolts")).unwrap();

        let mine = db.list_products_for_vendor(vendor.id).unwrap();
        assert_eq!(mine.len(), 2);

        let theirs = db.list_products_for_vendor(Uuid::new_v4()).unwrap();
        assert!(theirs.is_empty());
    }

    #[test]
    fn update_replaces_images_and_bumps_timestamp() {
        let (db, vendor) = seeded_db();
        let mut product = listing(vendor.id, "Fasteners");
        db.create_product(&product).unwrap();
        let original_updated = product.updated_at;

        product.images = vec![
            "https://m/products/images/b.jpg".into(),
            "https://m/products/images/c.jpg".into(),
        ];
        product.price = 525.0;
        db.update_product(&mut product).unwrap();

        let fetched = db.get_product(product.id).unwrap();
        assert_eq!(fetched.images.len(), 2);
        assert_eq!(fetched.price, 525.0);
        assert!(fetched.updated_at >= original_updated);
    }

    #[test]
    fn delete_then_fetch_is_not_found() {
        let (db, vendor) = seeded_db();
        let product = listing(vendor.id, "Fasteners");
        db.create_product(&product).unwrap();

        assert!(db.delete_product(product.id).unwrap());
        assert!(matches!(
            db.get_product(product.id).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(!db.delete_product(product.id).unwrap());
    }
}
