//! CRUD and KYC/trust lifecycle operations for [`VendorRecord`]s.
//!
//! The lifecycle rules live here next to the writes that implement them:
//! any document change recomputes the trust score and drops the record
//! back to `pending`, admin decisions flip `kyc_status` only, and admin
//! ratings touch the `trust` review block only.

use chrono::{DateTime, Utc};
use rusqlite::params;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::identities::conversion;
use mela_core::models::{
    Address, BankDetails, DocumentSet, ProfileUpdate, TrustReview, VendorRecord,
};
use mela_core::trust::compute_trust_score;
use mela_core::types::{DocumentKind, KycStatus};

const VENDOR_COLUMNS: &str = "id, identity_id, name, email, company_name, description, \
     gst_number, pan_number, cin, entity_type, promoter_names, phone, alt_phone, spoc_name, \
     address, bank_details, documents, kyc_status, trust_score, trust, is_verified, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new vendor record.
    pub fn create_vendor(&self, vendor: &VendorRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO vendors (id, identity_id, name, email, company_name, description,
                 gst_number, pan_number, cin, entity_type, promoter_names, phone, alt_phone,
                 spoc_name, address, bank_details, documents, kyc_status, trust_score, trust,
                 is_verified, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                vendor.id.to_string(),
                vendor.identity_id.to_string(),
                vendor.name,
                vendor.email,
                vendor.company_name,
                vendor.description,
                vendor.gst_number,
                vendor.pan_number,
                vendor.cin,
                vendor.entity_type,
                vendor.promoter_names,
                vendor.phone,
                vendor.alt_phone,
                vendor.spoc_name,
                serde_json::to_string(&vendor.address)?,
                serde_json::to_string(&vendor.bank_details)?,
                serde_json::to_string(&vendor.documents)?,
                vendor.kyc_status.as_str(),
                vendor.trust_score,
                serde_json::to_string(&vendor.trust)?,
                vendor.is_verified,
                vendor.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single vendor record by UUID.
    pub fn get_vendor(&self, id: Uuid) -> Result<VendorRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?1"),
                params![id.to_string()],
                row_to_vendor,
            )
            .map_err(not_found)
    }

    /// Fetch the vendor record owned by an identity.
    pub fn get_vendor_by_identity(&self, identity_id: Uuid) -> Result<VendorRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE identity_id = ?1"),
                params![identity_id.to_string()],
                row_to_vendor,
            )
            .map_err(not_found)
    }

    /// List all vendor records, newest first.
    pub fn list_vendors(&self) -> Result<Vec<VendorRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map([], row_to_vendor)?;

        let mut vendors = Vec::new();
        for row in rows {
            vendors.push(row?);
        }
        Ok(vendors)
    }

    // ------------------------------------------------------------------
    // Profile mutation
    // ------------------------------------------------------------------

    /// Apply a partial profile edit and persist the result.
    ///
    /// Profile completion feeds the trust score, so the score is
    /// recomputed and the record returns to `pending` for re-review.
    pub fn update_vendor_profile(
        &self,
        vendor_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<VendorRecord> {
        let mut vendor = self.get_vendor(vendor_id)?;
        update.apply(&mut vendor);
        vendor.trust_score = compute_trust_score(&vendor);
        vendor.kyc_status = KycStatus::Pending;
        self.save_vendor(&vendor)?;
        Ok(vendor)
    }

    /// Record an uploaded document locator on the vendor.
    ///
    /// `certification` uploads accumulate; every other kind overwrites
    /// its slot.  The trust score is recomputed and `kyc_status` resets
    /// to `pending` regardless of its prior value.  Callers must only
    /// invoke this after the locator is durably stored.
    pub fn attach_vendor_document(
        &self,
        vendor_id: Uuid,
        kind: DocumentKind,
        url: &str,
    ) -> Result<VendorRecord> {
        let mut vendor = self.get_vendor(vendor_id)?;

        match kind {
            DocumentKind::GstCert => vendor.documents.gst_cert = url.to_string(),
            DocumentKind::PanCard => vendor.documents.pan_card = url.to_string(),
            DocumentKind::License => vendor.documents.license = url.to_string(),
            DocumentKind::Certification => vendor.documents.certifications.push(url.to_string()),
        }

        vendor.trust_score = compute_trust_score(&vendor);
        vendor.kyc_status = KycStatus::Pending;

        self.save_vendor(&vendor)?;
        Ok(vendor)
    }

    // ------------------------------------------------------------------
    // KYC / trust lifecycle (admin)
    // ------------------------------------------------------------------

    /// Admin KYC decision.  Sets the status and nothing else; re-sending
    /// the same decision is a no-op on state.
    pub fn set_kyc_status(&self, vendor_id: Uuid, status: KycStatus) -> Result<VendorRecord> {
        let affected = self.conn().execute(
            "UPDATE vendors SET kyc_status = ?1 WHERE id = ?2",
            params![status.as_str(), vendor_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_vendor(vendor_id)
    }

    /// Admin trust rating.  Overwrites the review block with the new
    /// rating, the acting admin, and the current time; `kyc_status` is
    /// untouched.  Range validation happens before this is called.
    pub fn rate_vendor(
        &self,
        vendor_id: Uuid,
        rating: u8,
        reviewed_by: Uuid,
    ) -> Result<VendorRecord> {
        let trust = TrustReview {
            rating,
            reviewed_by: Some(reviewed_by),
            reviewed_at: Some(Utc::now()),
        };
        let affected = self.conn().execute(
            "UPDATE vendors SET trust = ?1 WHERE id = ?2",
            params![serde_json::to_string(&trust)?, vendor_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_vendor(vendor_id)
    }

    // ------------------------------------------------------------------
    // Full-row save
    // ------------------------------------------------------------------

    /// Persist every mutable column of a vendor record.
    fn save_vendor(&self, vendor: &VendorRecord) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE vendors SET
                 name = ?2, email = ?3, company_name = ?4, description = ?5,
                 gst_number = ?6, pan_number = ?7, cin = ?8, entity_type = ?9,
                 promoter_names = ?10, phone = ?11, alt_phone = ?12, spoc_name = ?13,
                 address = ?14, bank_details = ?15, documents = ?16, kyc_status = ?17,
                 trust_score = ?18, trust = ?19, is_verified = ?20
             WHERE id = ?1",
            params![
                vendor.id.to_string(),
                vendor.name,
                vendor.email,
                vendor.company_name,
                vendor.description,
                vendor.gst_number,
                vendor.pan_number,
                vendor.cin,
                vendor.entity_type,
                vendor.promoter_names,
                vendor.phone,
                vendor.alt_phone,
                vendor.spoc_name,
                serde_json::to_string(&vendor.address)?,
                serde_json::to_string(&vendor.bank_details)?,
                serde_json::to_string(&vendor.documents)?,
                vendor.kyc_status.as_str(),
                vendor.trust_score,
                serde_json::to_string(&vendor.trust)?,
                vendor.is_verified,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`VendorRecord`].
fn row_to_vendor(row: &rusqlite::Row<'_>) -> rusqlite::Result<VendorRecord> {
    let id_str: String = row.get(0)?;
    let identity_str: String = row.get(1)?;
    let address_json: String = row.get(14)?;
    let bank_json: String = row.get(15)?;
    let documents_json: String = row.get(16)?;
    let status_str: String = row.get(17)?;
    let trust_score: u8 = row.get(18)?;
    let trust_json: String = row.get(19)?;
    let created_str: String = row.get(21)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion(0, e))?;
    let identity_id = Uuid::parse_str(&identity_str).map_err(|e| conversion(1, e))?;
    let address: Address =
        serde_json::from_str(&address_json).map_err(|e| conversion(14, e))?;
    let bank_details: BankDetails =
        serde_json::from_str(&bank_json).map_err(|e| conversion(15, e))?;
    let documents: DocumentSet =
        serde_json::from_str(&documents_json).map_err(|e| conversion(16, e))?;
    let kyc_status = KycStatus::from_str(&status_str).map_err(|e| conversion(17, e))?;
    let trust: TrustReview =
        serde_json::from_str(&trust_json).map_err(|e| conversion(19, e))?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(21, e))?;

    Ok(VendorRecord {
        id,
        identity_id,
        name: row.get(2)?,
        email: row.get(3)?,
        company_name: row.get(4)?,
        description: row.get(5)?,
        gst_number: row.get(6)?,
        pan_number: row.get(7)?,
        cin: row.get(8)?,
        entity_type: row.get(9)?,
        promoter_names: row.get(10)?,
        phone: row.get(11)?,
        alt_phone: row.get(12)?,
        spoc_name: row.get(13)?,
        address,
        bank_details,
        documents,
        kyc_status,
        trust_score,
        trust,
        is_verified: row.get(20)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mela_core::models::Identity;
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

    #[test]
    fn create_and_fetch_round_trip() {
        let (db, vendor) = seeded_db();
        let fetched = db.get_vendor(vendor.id).unwrap();
        assert_eq!(fetched, vendor);

        let by_identity = db.get_vendor_by_identity(vendor.identity_id).unwrap();
        assert_eq!(by_identity.id, vendor.id);
    }

    #[test]
    fn profile_update_merges_fields_and_rescores() {
        let (db, vendor) = seeded_db();

        let update = ProfileUpdate {
            company_name: Some("Asha Traders".into()),
            gst_number: Some("27AAACA1234A1Z5".into()),
            ..ProfileUpdate::default()
        };
        let updated = db.update_vendor_profile(vendor.id, &update).unwrap();

        assert_eq!(updated.company_name, "Asha Traders");
        // Untouched fields survive the merge.
        assert_eq!(updated.email, "asha@example.com");
        // email 10 + company 10 + gst 20
        assert_eq!(updated.trust_score, 40);
    }

    #[test]
    fn document_upload_resets_kyc_to_pending() {
        let (db, vendor) = seeded_db();
        db.set_kyc_status(vendor.id, KycStatus::Approved).unwrap();

        let after = db
            .attach_vendor_document(vendor.id, DocumentKind::License, "https://m/l.pdf")
            .unwrap();
        assert_eq!(after.kyc_status, KycStatus::Pending);
        assert_eq!(after.documents.license, "https://m/l.pdf");
    }

    #[test]
    fn document_upload_resets_rejected_kyc_to_pending() {
        let (db, vendor) = seeded_db();
        db.set_kyc_status(vendor.id, KycStatus::Rejected).unwrap();

        let after = db
            .attach_vendor_document(vendor.id, DocumentKind::PanCard, "https://m/p.pdf")
            .unwrap();
        assert_eq!(after.kyc_status, KycStatus::Pending);
    }

    #[test]
    fn both_certificates_bump_score() {
        let (db, vendor) = seeded_db();

        let after = db
            .attach_vendor_document(vendor.id, DocumentKind::GstCert, "https://m/g.pdf")
            .unwrap();
        // email only; a single certificate does not score.
        assert_eq!(after.trust_score, 10);

        let after = db
            .attach_vendor_document(vendor.id, DocumentKind::PanCard, "https://m/p.pdf")
            .unwrap();
        assert_eq!(after.trust_score, 30);
    }

    #[test]
    fn certifications_accumulate() {
        let (db, vendor) = seeded_db();
        db.attach_vendor_document(vendor.id, DocumentKind::Certification, "https://m/a.pdf")
            .unwrap();
        let after = db
            .attach_vendor_document(vendor.id, DocumentKind::Certification, "https://m/b.pdf")
            .unwrap();
        assert_eq!(
            after.documents.certifications,
            vec!["https://m/a.pdf", "https://m/b.pdf"]
        );
    }

    #[test]
    fn kyc_decision_is_idempotent() {
        let (db, vendor) = seeded_db();
        let first = db.set_kyc_status(vendor.id, KycStatus::Approved).unwrap();
        let second = db.set_kyc_status(vendor.id, KycStatus::Approved).unwrap();
        assert_eq!(first.kyc_status, second.kyc_status);
        assert_eq!(first.trust, second.trust);
    }

    #[test]
    fn rating_sets_reviewer_and_leaves_kyc_alone() {
        let (db, vendor) = seeded_db();
        db.set_kyc_status(vendor.id, KycStatus::Approved).unwrap();

        let admin_id = Uuid::new_v4();
        let before = Utc::now();
        let rated = db.rate_vendor(vendor.id, 4, admin_id).unwrap();

        assert_eq!(rated.trust.rating, 4);
        assert_eq!(rated.trust.reviewed_by, Some(admin_id));
        assert!(rated.trust.reviewed_at.unwrap() >= before);
        assert_eq!(rated.kyc_status, KycStatus::Approved);
    }

    #[test]
    fn unknown_vendor_is_not_found() {
        let (db, _) = seeded_db();
        let missing = Uuid::new_v4();
        assert!(matches!(
            db.get_vendor(missing).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            db.set_kyc_status(missing, KycStatus::Rejected).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            db.rate_vendor(missing, 3, Uuid::new_v4()).unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn list_vendors_newest_first() {
        let (db, _) = seeded_db();
        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Bina".into(),
            email: "bina@example.com".into(),
            password_hash: None,
            role: Role::Vendor,
            google_sub: Some("google-sub-1".into()),
            created_at: Utc::now(),
        };
        db.create_identity(&identity).unwrap();
        let mut second = VendorRecord::new(identity.id, "Bina", "bina@example.com");
        second.created_at = Utc::now() + chrono::Duration::seconds(5);
        db.create_vendor(&second).unwrap();

        let all = db.list_vendors().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
    }
}
