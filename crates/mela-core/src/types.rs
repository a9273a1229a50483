//! Small enumerated types shared across the store and server crates.
//!
//! All of these serialize to the wire names the frontend expects
//! (camelCase / lowercase strings), and all round-trip through SQLite
//! TEXT columns via their `Display` / `FromStr` impls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Role of an authentication principal.
///
/// Roles are fixed at identity creation; there is no promotion flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// KYC review state of a vendor record.
///
/// `Pending` is the initial state and the state every document change
/// returns the record to.  `Approved` / `Rejected` are reached only
/// through an explicit admin decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for KycStatus {
    fn default() -> Self {
        KycStatus::Pending
    }
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KycStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(KycStatus::Pending),
            "approved" => Ok(KycStatus::Approved),
            "rejected" => Ok(KycStatus::Rejected),
            other => Err(ParseEnumError {
                kind: "kyc status",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether a listing is a physical product or a service offering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Product,
    Service,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Product => "product",
            ProductKind::Service => "service",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(ProductKind::Product),
            "service" => Ok(ProductKind::Service),
            other => Err(ParseEnumError {
                kind: "product kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Closed set of compliance document slots a vendor can upload into.
///
/// The upload endpoint takes one of these as its `type` field.  Using a
/// closed enum (rather than an arbitrary string key) keeps the document
/// map bounded and typo-proof.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentKind {
    /// GST registration certificate (tax id proof).
    #[serde(rename = "gstCert")]
    GstCert,
    /// PAN card (secondary id proof).
    #[serde(rename = "panCard")]
    PanCard,
    /// Trade / operating license.
    #[serde(rename = "license")]
    License,
    /// Any additional certification; these accumulate in a list instead
    /// of overwriting a single slot.
    #[serde(rename = "certification")]
    Certification,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::GstCert => "gstCert",
            DocumentKind::PanCard => "panCard",
            DocumentKind::License => "license",
            DocumentKind::Certification => "certification",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gstCert" => Ok(DocumentKind::GstCert),
            "panCard" => Ok(DocumentKind::PanCard),
            "license" => Ok(DocumentKind::License),
            "certification" => Ok(DocumentKind::Certification),
            other => Err(ParseEnumError {
                kind: "document kind",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kyc_status_round_trip() {
        for status in [KycStatus::Pending, KycStatus::Approved, KycStatus::Rejected] {
            assert_eq!(KycStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn kyc_status_rejects_unknown() {
        let err = KycStatus::from_str("verified").unwrap_err();
        assert_eq!(err.value, "verified");
    }

    #[test]
    fn document_kind_wire_names() {
        assert_eq!(DocumentKind::from_str("gstCert").unwrap(), DocumentKind::GstCert);
        assert_eq!(DocumentKind::from_str("certification").unwrap(), DocumentKind::Certification);
        assert!(DocumentKind::from_str("passport").is_err());
    }

    #[test]
    fn role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::from_str::<Role>("\"vendor\"").unwrap(), Role::Vendor);
    }
}
