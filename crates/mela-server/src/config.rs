//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./data/mela.db`
    pub database_path: PathBuf,

    /// Filesystem path where uploaded media objects are stored.
    /// Env: `MEDIA_STORAGE_PATH`
    /// Default: `./media`
    pub media_storage_path: PathBuf,

    /// Base URL prefixed onto stored-object locators handed to clients.
    /// Env: `PUBLIC_BASE_URL`
    /// Default: `http://localhost:5000`
    pub public_base_url: String,

    /// HMAC secret for signing bearer tokens.
    /// Env: `JWT_SECRET`
    /// Default: a dev-only placeholder (a warning is logged).
    pub jwt_secret: String,

    /// OAuth client id used to check the audience of federated login
    /// tokens.  Env: `GOOGLE_CLIENT_ID`.  Default: unset (audience check
    /// skipped).
    pub google_client_id: Option<String>,

    /// Comma-separated list of allowed CORS origins, or `*`.
    /// Env: `ALLOWED_ORIGINS`
    /// Default: `*`
    pub allowed_origins: Vec<String>,

    /// Maximum accepted upload size in bytes (10 MiB).
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// Bootstrap admin credentials.  When both are set and no identity
    /// with that email exists, an admin principal is seeded at startup.
    /// Env: `ADMIN_EMAIL` / `ADMIN_PASSWORD`
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// Placeholder secret so a bare `cargo run` works.  Production must set
/// `JWT_SECRET`.
const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 5000).into(),
            database_path: PathBuf::from("./data/mela.db"),
            media_storage_path: PathBuf::from("./media"),
            public_base_url: "http://localhost:5000".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            google_client_id: None,
            allowed_origins: vec!["*".to_string()],
            max_upload_size: 10 * 1024 * 1024, // 10 MiB
            admin_email: None,
            admin_password: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("MEDIA_STORAGE_PATH") {
            config.media_storage_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }

        match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using dev-only placeholder");
            }
        }

        if let Ok(id) = std::env::var("GOOGLE_CLIENT_ID") {
            if !id.is_empty() {
                config.google_client_id = Some(id);
            }
        }

        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            let parsed: Vec<String> = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.allowed_origins = parsed;
            }
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_upload_size = n;
            }
        }

        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            if !email.is_empty() {
                config.admin_email = Some(email);
            }
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = Some(password);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// True when CORS should allow any origin.
    pub fn allow_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert!(config.allow_any_origin());
        assert!(config.admin_email.is_none());
    }

    #[test]
    fn test_origin_list() {
        let config = ServerConfig {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://mela.example.com".to_string(),
            ],
            ..ServerConfig::default()
        };
        assert!(!config.allow_any_origin());
    }
}
