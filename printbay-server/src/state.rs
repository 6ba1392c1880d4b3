//! Application state

use std::sync::Arc;

use crate::config::Config;
use crate::integrations::{
    BlobStore, Database, LocalBlobStore, Mailer, MockDatabase, MockMailer, MockPaymentGateway,
    MockShipping, PaymentGateway, PgDatabase, S3BlobStore, SendGridMailer, ShippingProvider,
    ShippoProvider, StripeGateway,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Integrations are chosen once from [`Config`]; handlers never decide
/// between mock and real themselves.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<dyn Database>,
    /// Primary store for uploads (S3 when configured)
    pub blobs: Arc<dyn BlobStore>,
    /// In-process store, the fallback when the primary store fails
    pub local_blobs: Arc<LocalBlobStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub shipping: Arc<dyn ShippingProvider>,
}

impl AppState {
    /// Build state from configuration, connecting configured vendors
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let local_blobs = Arc::new(LocalBlobStore::new());

        let database: Arc<dyn Database> = match &config.database_url {
            Some(url) => Arc::new(PgDatabase::connect(url).await?),
            None => Arc::new(MockDatabase),
        };
        let blobs: Arc<dyn BlobStore> = match &config.storage_bucket {
            Some(bucket) => Arc::new(
                S3BlobStore::new(bucket.clone(), config.storage_public_base_url.clone()).await,
            ),
            None => local_blobs.clone(),
        };
        let payments: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeGateway::new(key.clone())),
            None => Arc::new(MockPaymentGateway),
        };
        let mailer: Arc<dyn Mailer> = match &config.sendgrid_api_key {
            Some(key) => Arc::new(SendGridMailer::new(
                key.clone(),
                config.sendgrid_from_email.clone(),
            )),
            None => Arc::new(MockMailer),
        };
        let shipping: Arc<dyn ShippingProvider> = match &config.shippo_api_key {
            Some(key) => Arc::new(ShippoProvider::new(key.clone(), config.ship_from.clone())),
            None => Arc::new(MockShipping),
        };

        for (service, configured) in [
            ("database", database.is_configured()),
            ("storage", blobs.is_configured()),
            ("payments", payments.is_configured()),
            ("email", mailer.is_configured()),
            ("shipping", shipping.is_configured()),
        ] {
            if configured {
                tracing::info!(service, "Integration configured");
            } else {
                tracing::warn!(service, "Integration not configured, using mock");
            }
        }

        Ok(Self {
            config: Arc::new(config),
            database,
            blobs,
            local_blobs,
            payments,
            mailer,
            shipping,
        })
    }

    /// Every integration in mock mode; no I/O
    pub fn unconfigured(config: Config) -> Self {
        let local_blobs = Arc::new(LocalBlobStore::new());
        Self {
            config: Arc::new(config),
            database: Arc::new(MockDatabase),
            blobs: local_blobs.clone(),
            local_blobs,
            payments: Arc::new(MockPaymentGateway),
            mailer: Arc::new(MockMailer),
            shipping: Arc::new(MockShipping),
        }
    }

    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = database;
        self
    }

    pub fn with_blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn with_payments(mut self, payments: Arc<dyn PaymentGateway>) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_shipping(mut self, shipping: Arc<dyn ShippingProvider>) -> Self {
        self.shipping = shipping;
        self
    }

    /// Fetch stored upload bytes, trying the primary store then the local one
    pub async fn load_blob(&self, file_id: &str) -> Option<axum::body::Bytes> {
        match self.blobs.get(file_id).await {
            Ok(Some(bytes)) => return Some(bytes),
            Ok(None) => {}
            Err(e) => tracing::warn!(file_id = %file_id, error = %e, "Blob fetch failed"),
        }
        self.local_blobs.get(file_id).await.ok().flatten()
    }
}
