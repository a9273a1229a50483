//! Domain entities persisted by `mela-store`.
//!
//! Every struct derives `Serialize` / `Deserialize` with camelCase wire
//! names so it can be handed directly to the HTTP layer as a JSON body.
//! Credential material lives only on [`Identity`]; vendor and product
//! records never carry a password hash, so serializing them for a public
//! listing is safe by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{KycStatus, ProductKind, Role};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An authentication principal: credentials plus role.
///
/// One identity exists per registered email.  Vendors additionally own a
/// [`VendorRecord`] referencing this identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    /// Unique login email.
    pub email: String,
    /// Argon2id PHC-format hash.  `None` for identities created through a
    /// federated login that never set a password.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    /// Subject id from the external identity provider, if this principal
    /// was created via federated login.
    pub google_sub: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Vendor record
// ---------------------------------------------------------------------------

/// Structured postal address.  The canonical shape; legacy flat strings
/// are normalized into `street` at the API boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
}

impl Address {
    /// True when all four sub-fields are filled in.
    pub fn is_complete(&self) -> bool {
        !self.street.is_empty()
            && !self.city.is_empty()
            && !self.state.is_empty()
            && !self.postal_code.is_empty()
    }

    /// Accept a legacy single-line address by storing it as the street
    /// component.  The remaining sub-fields stay empty, so a flat-string
    /// address never counts as complete for scoring.
    pub fn from_flat(line: &str) -> Self {
        Address {
            street: line.trim().to_string(),
            ..Address::default()
        }
    }
}

/// Payout account details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    #[serde(default)]
    pub account_number: String,
    /// Bank routing code (IFSC).
    #[serde(default)]
    pub ifsc: String,
}

impl BankDetails {
    pub fn is_complete(&self) -> bool {
        !self.account_number.is_empty() && !self.ifsc.is_empty()
    }
}

/// Compliance document locators, one slot per [`crate::DocumentKind`]
/// except certifications, which accumulate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSet {
    #[serde(default)]
    pub gst_cert: String,
    #[serde(default)]
    pub pan_card: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// Admin-assigned trust review: a 0-5 human rating, independent of the
/// computed trust score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustReview {
    /// Integer rating in [0, 5].
    pub rating: u8,
    /// Identity id of the admin who last rated this vendor.
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// A vendor's business profile, documents, and review state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VendorRecord {
    pub id: Uuid,
    /// The owning authentication principal (1:1, required).
    pub identity_id: Uuid,
    pub name: String,
    /// Denormalized copy of the identity email, used for public listings.
    pub email: String,

    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub description: String,
    /// GST registration number (tax id).
    #[serde(default)]
    pub gst_number: String,
    /// PAN number (secondary id).
    #[serde(default)]
    pub pan_number: String,
    /// Corporate identification number.
    #[serde(default)]
    pub cin: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub promoter_names: String,

    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub alt_phone: String,
    /// Single point of contact.
    #[serde(default)]
    pub spoc_name: String,

    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub bank_details: BankDetails,
    #[serde(default)]
    pub documents: DocumentSet,

    #[serde(default)]
    pub kyc_status: KycStatus,
    /// Latest output of the trust scoring engine (0-100).
    #[serde(default)]
    pub trust_score: u8,
    #[serde(default)]
    pub trust: TrustReview,
    /// Set through an external verification flow, never by the vendor.
    #[serde(default)]
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,
}

impl VendorRecord {
    /// A blank profile for a freshly registered vendor.
    pub fn new(identity_id: Uuid, name: &str, email: &str) -> Self {
        VendorRecord {
            id: Uuid::new_v4(),
            identity_id,
            name: name.to_string(),
            email: email.to_string(),
            company_name: String::new(),
            description: String::new(),
            gst_number: String::new(),
            pan_number: String::new(),
            cin: String::new(),
            entity_type: String::new(),
            promoter_names: String::new(),
            phone: String::new(),
            alt_phone: String::new(),
            spoc_name: String::new(),
            address: Address::default(),
            bank_details: BankDetails::default(),
            documents: DocumentSet::default(),
            kyc_status: KycStatus::Pending,
            trust_score: 0,
            trust: TrustReview::default(),
            is_verified: false,
            created_at: Utc::now(),
        }
    }
}

/// Partial profile edit submitted by a vendor.
///
/// Only the whitelisted business/contact/bank/address fields can be
/// touched this way; review state, the verified flag, and the score are
/// never writable by the vendor.  `None` means "leave unchanged", so
/// concurrent edits merge at field level rather than clobbering the
/// whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub cin: Option<String>,
    pub entity_type: Option<String>,
    pub promoter_names: Option<String>,
    pub phone: Option<String>,
    pub alt_phone: Option<String>,
    pub spoc_name: Option<String>,
    pub address: Option<Address>,
    pub bank_details: Option<BankDetails>,
}

impl ProfileUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }

    /// Apply the set fields onto a vendor record, leaving the rest alone.
    pub fn apply(&self, vendor: &mut VendorRecord) {
        if let Some(v) = &self.company_name {
            vendor.company_name = v.clone();
        }
        if let Some(v) = &self.description {
            vendor.description = v.clone();
        }
        if let Some(v) = &self.gst_number {
            vendor.gst_number = v.clone();
        }
        if let Some(v) = &self.pan_number {
            vendor.pan_number = v.clone();
        }
        if let Some(v) = &self.cin {
            vendor.cin = v.clone();
        }
        if let Some(v) = &self.entity_type {
            vendor.entity_type = v.clone();
        }
        if let Some(v) = &self.promoter_names {
            vendor.promoter_names = v.clone();
        }
        if let Some(v) = &self.phone {
            vendor.phone = v.clone();
        }
        if let Some(v) = &self.alt_phone {
            vendor.alt_phone = v.clone();
        }
        if let Some(v) = &self.spoc_name {
            vendor.spoc_name = v.clone();
        }
        if let Some(v) = &self.address {
            vendor.address = v.clone();
        }
        if let Some(v) = &self.bank_details {
            vendor.bank_details = v.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Product record
// ---------------------------------------------------------------------------

/// A product or service listing owned by exactly one vendor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    /// Wire name `type`, matching the original API.
    #[serde(rename = "type")]
    pub kind: ProductKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specifications: String,
    /// Non-negative; enforced at the API boundary before any write.
    pub price: f64,
    /// Locator URLs; list order is display order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Optional catalogue (PDF) locator.
    #[serde(default)]
    pub catalogue: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_completeness() {
        let mut addr = Address {
            street: "12 Market Rd".into(),
            city: "Pune".into(),
            state: "MH".into(),
            postal_code: "411001".into(),
        };
        assert!(addr.is_complete());
        addr.postal_code.clear();
        assert!(!addr.is_complete());
    }

    #[test]
    fn flat_address_is_never_complete() {
        let addr = Address::from_flat("12 Market Rd, Pune, MH 411001");
        assert_eq!(addr.street, "12 Market Rd, Pune, MH 411001");
        assert!(!addr.is_complete());
    }

    #[test]
    fn identity_never_serializes_password_hash() {
        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: Some("$argon2id$...".into()),
            role: Role::Vendor,
            google_sub: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn vendor_record_defaults() {
        let v = VendorRecord::new(Uuid::new_v4(), "Asha", "asha@example.com");
        assert_eq!(v.kyc_status, KycStatus::Pending);
        assert_eq!(v.trust_score, 0);
        assert_eq!(v.trust.rating, 0);
        assert!(!v.is_verified);
    }
}
