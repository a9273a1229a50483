//! CRUD operations for [`Identity`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use mela_core::models::Identity;
use mela_core::types::Role;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new identity.  Returns [`StoreError::Conflict`] when the
    /// email is already registered.
    pub fn create_identity(&self, identity: &Identity) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO identities (id, name, email, password_hash, role, google_sub, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    identity.id.to_string(),
                    identity.name,
                    identity.email,
                    identity.password_hash,
                    identity.role.as_str(),
                    identity.google_sub,
                    identity.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::Conflict
                }
                other => StoreError::Sqlite(other),
            })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single identity by UUID.
    pub fn get_identity(&self, id: Uuid) -> Result<Identity> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, role, google_sub, created_at
                 FROM identities
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_identity,
            )
            .map_err(not_found)
    }

    /// Fetch an identity by login email.
    pub fn get_identity_by_email(&self, email: &str) -> Result<Identity> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, role, google_sub, created_at
                 FROM identities
                 WHERE email = ?1",
                params![email],
                row_to_identity,
            )
            .map_err(not_found)
    }

    /// Fetch an identity by email, restricted to a given role.  Used by
    /// admin login, which must not match vendor principals.
    pub fn get_identity_by_email_and_role(&self, email: &str, role: Role) -> Result<Identity> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, role, google_sub, created_at
                 FROM identities
                 WHERE email = ?1 AND role = ?2",
                params![email, role.as_str()],
                row_to_identity,
            )
            .map_err(not_found)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete an identity by UUID.  Only used as the compensation step
    /// when vendor-record creation fails after the identity write.
    pub fn delete_identity(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM identities WHERE id = ?1",
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

/// Map a `rusqlite::Row` to an [`Identity`].
fn row_to_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let password_hash: Option<String> = row.get(3)?;
    let role_str: String = row.get(4)?;
    let google_sub: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion(0, e))?;
    let role = Role::from_str(&role_str).map_err(|e| conversion(4, e))?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(6, e))?;

    Ok(Identity {
        id,
        name,
        email,
        password_hash,
        role,
        google_sub,
        created_at,
    })
}

pub(crate) fn conversion<E>(col: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str, role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: email.into(),
            password_hash: Some("$argon2id$test".into()),
            role,
            google_sub: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_fetch_by_email() {
        let db = Database::open_in_memory().unwrap();
        let ident = identity("asha@example.com", Role::Vendor);
        db.create_identity(&ident).unwrap();

        let fetched = db.get_identity_by_email("asha@example.com").unwrap();
        assert_eq!(fetched.id, ident.id);
        assert_eq!(fetched.role, Role::Vendor);
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_identity(&identity("asha@example.com", Role::Vendor))
            .unwrap();

        let err = db
            .create_identity(&identity("asha@example.com", Role::Vendor))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn role_scoped_lookup() {
        let db = Database::open_in_memory().unwrap();
        db.create_identity(&identity("asha@example.com", Role::Vendor))
            .unwrap();

        let err = db
            .get_identity_by_email_and_role("asha@example.com", Role::Admin)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn delete_identity_removes_row() {
        let db = Database::open_in_memory().unwrap();
        let ident = identity("asha@example.com", Role::Vendor);
        db.create_identity(&ident).unwrap();

        assert!(db.delete_identity(ident.id).unwrap());
        assert!(matches!(
            db.get_identity(ident.id).unwrap_err(),
            StoreError::NotFound
        ));
    }
}
