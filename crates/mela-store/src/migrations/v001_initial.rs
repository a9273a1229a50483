//! v001 -- Initial schema creation.
//!
//! Creates the three collections: `identities`, `vendors`, `products`.
//! Nested structures (address, bank details, documents, trust review,
//! image lists) live in JSON text columns.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Identities (authentication principals)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS identities (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT,                       -- argon2id PHC string; NULL for federated-only
    role          TEXT NOT NULL,              -- 'vendor' | 'admin'
    google_sub    TEXT,                       -- external provider subject id
    created_at    TEXT NOT NULL               -- ISO-8601 / RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_identities_email ON identities(email);

-- ----------------------------------------------------------------
-- Vendors (business profiles)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS vendors (
    id             TEXT PRIMARY KEY NOT NULL, -- UUID v4
    identity_id    TEXT NOT NULL UNIQUE,      -- FK -> identities(id), 1:1
    name           TEXT NOT NULL,
    email          TEXT NOT NULL,             -- denormalized from identity
    company_name   TEXT NOT NULL DEFAULT '',
    description    TEXT NOT NULL DEFAULT '',
    gst_number     TEXT NOT NULL DEFAULT '',
    pan_number     TEXT NOT NULL DEFAULT '',
    cin            TEXT NOT NULL DEFAULT '',
    entity_type    TEXT NOT NULL DEFAULT '',
    promoter_names TEXT NOT NULL DEFAULT '',
    phone          TEXT NOT NULL DEFAULT '',
    alt_phone      TEXT NOT NULL DEFAULT '',
    spoc_name      TEXT NOT NULL DEFAULT '',
    address        TEXT NOT NULL DEFAULT '{}',-- JSON Address
    bank_details   TEXT NOT NULL DEFAULT '{}',-- JSON BankDetails
    documents      TEXT NOT NULL DEFAULT '{}',-- JSON DocumentSet
    kyc_status     TEXT NOT NULL DEFAULT 'pending',
    trust_score    INTEGER NOT NULL DEFAULT 0,
    trust          TEXT NOT NULL DEFAULT '{}',-- JSON TrustReview
    is_verified    INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,

    FOREIGN KEY (identity_id) REFERENCES identities(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_vendors_identity ON vendors(identity_id);
CREATE INDEX IF NOT EXISTS idx_vendors_email ON vendors(email);

-- ----------------------------------------------------------------
-- Products (vendor-owned listings)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS products (
    id             TEXT PRIMARY KEY NOT NULL, -- UUID v4
    vendor_id      TEXT NOT NULL,             -- FK -> vendors(id)
    name           TEXT NOT NULL,
    kind           TEXT NOT NULL,             -- 'product' | 'service'
    description    TEXT NOT NULL DEFAULT '',
    specifications TEXT NOT NULL DEFAULT '',
    price          REAL NOT NULL,
    images         TEXT NOT NULL DEFAULT '[]',-- JSON array of locator URLs
    catalogue      TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,

    FOREIGN KEY (vendor_id) REFERENCES vendors(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_products_vendor ON products(vendor_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
