use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ChronicClaims";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides the data directory (database, attachments, reference data).
pub const DATA_DIR_ENV: &str = "CHRONIC_CLAIMS_DATA_DIR";

/// Overrides the HTTP bind address.
pub const BIND_ENV: &str = "CHRONIC_CLAIMS_BIND";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8780";

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "chronic_claims=info,tower_http=warn"
}

/// Get the application data directory.
/// `$CHRONIC_CLAIMS_DATA_DIR` when set, otherwise ~/ChronicClaims/.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// SQLite database holding cases, patients, activities and referrals
pub fn database_path() -> PathBuf {
    app_data_dir().join("claims.db")
}

/// Directory with conditions.json, treatments.json and medicines.json
pub fn reference_dir() -> PathBuf {
    app_data_dir().join("reference")
}

/// Root for basket-item documentation uploads
pub fn attachments_dir() -> PathBuf {
    app_data_dir().join("attachments")
}

/// Resolve the HTTP bind address, falling back to the default on a bad value.
pub fn bind_addr() -> SocketAddr {
    let raw = std::env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    parse_bind_addr(&raw)
}

fn parse_bind_addr(raw: &str) -> SocketAddr {
    match raw.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Invalid bind address, using default");
            SocketAddr::from(([127, 0, 0, 1], 8780))
        }
    }
}
