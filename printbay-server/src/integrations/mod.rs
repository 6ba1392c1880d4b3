//! Vendor integrations
//!
//! One trait per concern. Each has a mock used when the vendor is not
//! configured and a thin REST or client-crate adapter used when it is.
//! The choice is made once, at startup, in [`crate::state::AppState::new`].

pub mod database;
pub mod email;
pub mod payments;
pub mod shipping;
pub mod storage;

pub use database::{Database, MockDatabase, PgDatabase};
pub use email::{EmailMessage, Mailer, MockMailer, SendGridMailer};
pub use payments::{MockPaymentGateway, PaymentGateway, StripeGateway};
pub use shipping::{MockShipping, Parcel, PurchasedLabel, ShippingProvider, ShippoProvider};
pub use storage::{BlobObject, BlobStore, LocalBlobStore, S3BlobStore};

use crate::error::IntegrationError;

/// Vendor URL with each segment percent-encoded
///
/// A caller-supplied id can never add path levels: `/` is escaped and bare
/// `.`/`..` segments are dropped.
pub(crate) fn endpoint(
    service: &'static str,
    base_url: &str,
    segments: &[&str],
) -> Result<reqwest::Url, IntegrationError> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| IntegrationError::vendor(service, format!("invalid base url: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| IntegrationError::vendor(service, "base url cannot hold a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `router` on an ephemeral port, returning its base URL
    pub(crate) async fn stub_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
