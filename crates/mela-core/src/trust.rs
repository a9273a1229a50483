//! Trust scoring engine.
//!
//! Computes a deterministic 0-100 completeness score from a vendor record
//! snapshot: a proxy for "how much verifiable information has this vendor
//! supplied", not a quality judgement.  The admin-assigned 0-5 rating in
//! [`crate::TrustReview`] is a separate concept and never feeds into this
//! score.

use crate::models::VendorRecord;

/// Maximum score.  The additive weights below sum to 120, so the clamp
/// is load-bearing whenever a verified vendor has filled everything in.
pub const MAX_TRUST_SCORE: u8 = 100;

/// Compute the completeness score for a vendor snapshot.
///
/// Pure and total: every field contributes either its full weight or
/// nothing, empty strings count as absent, and no input can make this
/// panic.
pub fn compute_trust_score(vendor: &VendorRecord) -> u8 {
    let mut score: u32 = 0;

    if !vendor.email.is_empty() {
        score += 10;
    }
    if !vendor.company_name.is_empty() {
        score += 10;
    }
    if !vendor.gst_number.is_empty() {
        score += 20;
    }
    if !vendor.pan_number.is_empty() {
        score += 10;
    }
    if vendor.address.is_complete() {
        score += 10;
    }
    if vendor.bank_details.is_complete() {
        score += 20;
    }
    if !vendor.documents.gst_cert.is_empty() && !vendor.documents.pan_card.is_empty() {
        score += 20;
    }
    if vendor.is_verified {
        score += 20;
    }

    score.min(MAX_TRUST_SCORE as u32) as u8
}

/// Validate an admin rating from the wire.
///
/// The API accepts a JSON number, so the raw value arrives as `f64`;
/// only the integers 0..=5 are allowed.  Fractional values (5.5) and
/// out-of-range integers (-1, 6) are rejected.
pub fn validate_rating(raw: f64) -> Option<u8> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return None;
    }
    if !(0.0..=5.0).contains(&raw) {
        return None;
    }
    Some(raw as u8)
}
