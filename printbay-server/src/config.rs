//! Service configuration
//!
//! Every vendor credential is optional. A vendor whose credential is
//! missing, empty or still a template placeholder runs in mock mode.

use shared::models::Address;

/// Default upload ceiling: 50 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// HTTP service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Directory for rotating log files
    pub log_dir: Option<String>,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// S3 bucket holding uploaded models
    pub storage_bucket: Option<String>,
    /// Public base URL for stored objects (CDN or bucket URL)
    pub storage_public_base_url: Option<String>,
    /// PostgreSQL connection URL
    pub database_url: Option<String>,
    /// Stripe secret key
    pub stripe_secret_key: Option<String>,
    /// SendGrid API key
    pub sendgrid_api_key: Option<String>,
    /// Sender address for outgoing email
    pub sendgrid_from_email: String,
    /// Shippo API token
    pub shippo_api_key: Option<String>,
    /// Origin address for shipments
    pub ship_from: Address,
}

/// True when a credential value is still a template placeholder
pub fn is_placeholder(value: &str) -> bool {
    value.contains("your_") || value.contains("your-") || value.ends_with("_here")
}

/// Read a credential, treating empty and placeholder values as absent
fn credential(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !is_placeholder(v))
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Shipment origin used when SHIP_FROM_* is unset
pub fn default_ship_from() -> Address {
    Address {
        name: "The Printed Bay".into(),
        company: Some("The Printed Bay LLC".into()),
        street1: "123 Maker Street".into(),
        street2: None,
        city: "Austin".into(),
        state: "TX".into(),
        zip: "78701".into(),
        country: "US".into(),
        phone: Some("555-0123".into()),
        email: Some("orders@theprintedbay.com".into()),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = default_ship_from();
        let ship_from = Address {
            name: var_or("SHIP_FROM_NAME", &defaults.name),
            company: Some(var_or(
                "SHIP_FROM_COMPANY",
                defaults.company.as_deref().unwrap_or_default(),
            )),
            street1: var_or("SHIP_FROM_STREET1", &defaults.street1),
            street2: None,
            city: var_or("SHIP_FROM_CITY", &defaults.city),
            state: var_or("SHIP_FROM_STATE", &defaults.state),
            zip: var_or("SHIP_FROM_ZIP", &defaults.zip),
            country: var_or("SHIP_FROM_COUNTRY", &defaults.country),
            phone: Some(var_or(
                "SHIP_FROM_PHONE",
                defaults.phone.as_deref().unwrap_or_default(),
            )),
            email: Some(var_or(
                "SHIP_FROM_EMAIL",
                defaults.email.as_deref().unwrap_or_default(),
            )),
        };

        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7071),
            environment: var_or("ENVIRONMENT", "development"),
            log_level: var_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            storage_bucket: credential("STORAGE_BUCKET"),
            storage_public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            database_url: credential("DATABASE_URL"),
            stripe_secret_key: credential("STRIPE_SECRET_KEY"),
            sendgrid_api_key: credential("SENDGRID_API_KEY"),
            sendgrid_from_email: var_or("SENDGRID_FROM_EMAIL", "noreply@theprintedbay.com"),
            shippo_api_key: credential("SHIPPO_API_KEY"),
            ship_from,
        }
    }

    /// All vendors unconfigured, environment untouched
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            environment: "development".into(),
            log_level: "debug".into(),
            log_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            storage_bucket: None,
            storage_public_base_url: None,
            database_url: None,
            stripe_secret_key: None,
            sendgrid_api_key: None,
            sendgrid_from_email: "noreply@theprintedbay.com".into(),
            shippo_api_key: None,
            ship_from: default_ship_from(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
