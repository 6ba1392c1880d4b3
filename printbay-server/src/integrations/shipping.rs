//! Shipping rates, labels and tracking via the Shippo REST API

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use shared::models::shipping::flat_rates;
use shared::models::{Address, ServiceLevel, ShippingItem, ShippingRate, TrackingEvent, TrackingInfo};

use crate::error::IntegrationError;
use crate::integrations::endpoint;

pub const SHIPPO_API_BASE: &str = "https://api.goshippo.com";

/// A purchased label as reported by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct PurchasedLabel {
    pub carrier: String,
    pub label_url: String,
    pub tracking_number: String,
    pub tracking_url: Option<String>,
    pub cost: f64,
    pub currency: String,
    pub transaction_id: Option<String>,
}

#[async_trait]
pub trait ShippingProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn get_rates(
        &self,
        to: &Address,
        items: &[ShippingItem],
    ) -> Result<Vec<ShippingRate>, IntegrationError>;

    async fn create_label(
        &self,
        rate_id: &str,
        order_id: &str,
    ) -> Result<PurchasedLabel, IntegrationError>;

    /// `None` when the carrier has no record of the number
    async fn track(
        &self,
        tracking_number: &str,
        carrier: &str,
    ) -> Result<Option<TrackingInfo>, IntegrationError>;
}

/// Parcel sent with a rate request
///
/// Inches and ounces. Missing item dimensions default to 6x4x3 and the
/// weight never drops below 1 oz.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub insured_value: f64,
}

impl Parcel {
    pub fn from_items(items: &[ShippingItem]) -> Self {
        let max_of = |f: fn(&ShippingItem) -> Option<f64>, default: f64| {
            items
                .iter()
                .map(|item| f(item).unwrap_or(default))
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
                .unwrap_or(default)
        };
        let weight: f64 = items.iter().map(|i| i.weight * f64::from(i.quantity)).sum();
        let insured_value: f64 = items.iter().map(|i| i.value * f64::from(i.quantity)).sum();
        Self {
            length: max_of(|i| i.length, 6.0),
            width: max_of(|i| i.width, 4.0),
            height: max_of(|i| i.height, 3.0),
            weight: weight.max(1.0),
            insured_value,
        }
    }
}

// =============================================================================
// Mock
// =============================================================================

/// Unconfigured mode: fixed USPS rates and a synthetic label
#[derive(Debug, Default)]
pub struct MockShipping;

#[async_trait]
impl ShippingProvider for MockShipping {
    fn is_configured(&self) -> bool {
        false
    }

    async fn get_rates(
        &self,
        _to: &Address,
        _items: &[ShippingItem],
    ) -> Result<Vec<ShippingRate>, IntegrationError> {
        Ok(flat_rates())
    }

    async fn create_label(
        &self,
        _rate_id: &str,
        order_id: &str,
    ) -> Result<PurchasedLabel, IntegrationError> {
        Ok(PurchasedLabel {
            carrier: "usps".into(),
            label_url: format!("https://mock-label.theprintedbay.com/{order_id}.pdf"),
            tracking_number: format!("TPB{}", shared::util::now_millis()),
            tracking_url: Some(format!("https://mock-tracking.theprintedbay.com/{order_id}")),
            cost: 8.99,
            currency: "USD".into(),
            transaction_id: None,
        })
    }

    async fn track(
        &self,
        tracking_number: &str,
        carrier: &str,
    ) -> Result<Option<TrackingInfo>, IntegrationError> {
        let now = Utc::now();
        Ok(Some(TrackingInfo {
            tracking_number: tracking_number.to_string(),
            carrier: carrier.to_string(),
            status: "TRANSIT".into(),
            status_date: Some(now),
            status_details: "Package is in transit".into(),
            eta: Some(now + Duration::days(3)),
            tracking_history: vec![
                TrackingEvent {
                    status: "PRE_TRANSIT".into(),
                    status_date: Some(now - Duration::days(1)),
                    status_details: "Label created".into(),
                    location: Some("Austin, TX".into()),
                },
                TrackingEvent {
                    status: "TRANSIT".into(),
                    status_date: Some(now),
                    status_details: "Package picked up and in transit".into(),
                    location: Some("Austin, TX".into()),
                },
            ],
        }))
    }
}

// =============================================================================
// Shippo
// =============================================================================

pub struct ShippoProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    ship_from: Address,
}

impl ShippoProvider {
    pub fn new(api_key: impl Into<String>, ship_from: Address) -> Self {
        Self::with_base_url(api_key, ship_from, SHIPPO_API_BASE)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        ship_from: Address,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ship_from,
        }
    }

    fn auth_header(&self) -> String {
        format!("ShippoToken {}", self.api_key)
    }
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn str_field(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

/// Shippo reports request errors as `{"detail": ...}` or per-field arrays
fn check_error(resp: &Value) -> Result<(), IntegrationError> {
    match resp.get("detail").and_then(Value::as_str) {
        Some(detail) => Err(IntegrationError::vendor("shippo", detail)),
        None => Ok(()),
    }
}

fn parse_rate(rate: &Value) -> ShippingRate {
    ShippingRate {
        rate_id: str_field(&rate["object_id"]),
        servicelevel: ServiceLevel {
            name: str_field(&rate["servicelevel"]["name"]),
            token: str_field(&rate["servicelevel"]["token"]),
        },
        amount: str_field(&rate["amount"]),
        currency: rate["currency"].as_str().unwrap_or("USD").to_string(),
        estimated_days: rate["estimated_days"]
            .as_u64()
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or(7),
        provider: str_field(&rate["provider"]),
        provider_image_75: rate["provider_image_75"].as_str().map(String::from),
        provider_image_200: rate["provider_image_200"].as_str().map(String::from),
    }
}

fn parse_tracking(resp: &Value, carrier: &str) -> Option<TrackingInfo> {
    let status = &resp["tracking_status"];
    if status.is_null() {
        return None;
    }
    let history = resp["tracking_history"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .map(|event| TrackingEvent {
                    status: str_field(&event["status"]),
                    status_date: parse_date(&event["status_date"]),
                    status_details: str_field(&event["status_details"]),
                    location: match (
                        event["location"]["city"].as_str(),
                        event["location"]["state"].as_str(),
                    ) {
                        (Some(city), Some(state)) => Some(format!("{city}, {state}")),
                        _ => None,
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    Some(TrackingInfo {
        tracking_number: str_field(&resp["tracking_number"]),
        carrier: resp["carrier"].as_str().unwrap_or(carrier).to_string(),
        status: str_field(&status["status"]),
        status_date: parse_date(&status["status_date"]),
        status_details: str_field(&status["status_details"]),
        eta: parse_date(&resp["eta"]),
        tracking_history: history,
    })
}

#[async_trait]
impl ShippingProvider for ShippoProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn get_rates(
        &self,
        to: &Address,
        items: &[ShippingItem],
    ) -> Result<Vec<ShippingRate>, IntegrationError> {
        let parcel = Parcel::from_items(items);
        let body = json!({
            "address_from": self.ship_from,
            "address_to": to,
            "parcels": [{
                "length": parcel.length.to_string(),
                "width": parcel.width.to_string(),
                "height": parcel.height.to_string(),
                "distance_unit": "in",
                "weight": parcel.weight.to_string(),
                "mass_unit": "oz",
            }],
            "extra": {
                "insurance": {
                    "amount": parcel.insured_value.to_string(),
                    "currency": "USD",
                }
            },
            "async": false,
        });

        let resp: Value = self
            .client
            .post(format!("{}/shipments/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        check_error(&resp)?;

        let rates: Vec<ShippingRate> = resp["rates"]
            .as_array()
            .map(|rates| rates.iter().map(parse_rate).collect())
            .unwrap_or_default();
        tracing::info!(count = rates.len(), "Retrieved shipping rates");
        Ok(rates)
    }

    async fn create_label(
        &self,
        rate_id: &str,
        order_id: &str,
    ) -> Result<PurchasedLabel, IntegrationError> {
        let resp: Value = self
            .client
            .post(format!("{}/transactions/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&json!({
                "rate": rate_id,
                "label_file_type": "PDF",
                "metadata": format!("Order: {order_id}"),
                "async": false,
            }))
            .send()
            .await?
            .json()
            .await?;
        check_error(&resp)?;

        let status = resp["status"].as_str().unwrap_or_default();
        if status != "SUCCESS" {
            return Err(IntegrationError::vendor(
                "shippo",
                format!("transaction failed with status: {status}"),
            ));
        }

        Ok(PurchasedLabel {
            carrier: resp["rate"]["provider"]
                .as_str()
                .unwrap_or("usps")
                .to_ascii_lowercase(),
            label_url: str_field(&resp["label_url"]),
            tracking_number: str_field(&resp["tracking_number"]),
            tracking_url: resp["tracking_url_provider"].as_str().map(String::from),
            cost: resp["rate"]["amount"]
                .as_str()
                .and_then(|a| a.parse().ok())
                .unwrap_or_default(),
            currency: resp["rate"]["currency"].as_str().unwrap_or("USD").to_string(),
            transaction_id: resp["object_id"].as_str().map(String::from),
        })
    }

    async fn track(
        &self,
        tracking_number: &str,
        carrier: &str,
    ) -> Result<Option<TrackingInfo>, IntegrationError> {
        let resp = self
            .client
            .get(endpoint("shippo", &self.base_url, &["tracks", carrier, tracking_number])?)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp: Value = resp.json().await?;
        check_error(&resp)?;
        Ok(parse_tracking(&resp, carrier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::test_support::stub_server;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "ShippoToken shippo_test_key")
    }

    /// Minimal Shippo: one rate, labels for `rate_ok` only, one known track
    async fn fake_shippo() -> String {
        let router = Router::new()
            .route(
                "/shipments/",
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    if !authorized(&headers) {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid token."})));
                    }
                    let parcel = &body["parcels"][0];
                    (
                        StatusCode::CREATED,
                        Json(json!({
                            "rates": [{
                                "object_id": "rate_ok",
                                "servicelevel": {"name": "Priority Mail", "token": "usps_priority"},
                                "amount": "7.35",
                                "currency": "USD",
                                "estimated_days": 2,
                                "provider": "USPS",
                                // echo the parcel so the caller's conversion is observable
                                "provider_image_75": format!(
                                    "{}{}/{}{}",
                                    parcel["weight"].as_str().unwrap_or("?"),
                                    parcel["mass_unit"].as_str().unwrap_or("?"),
                                    parcel["length"].as_str().unwrap_or("?"),
                                    parcel["distance_unit"].as_str().unwrap_or("?"),
                                ),
                            }]
                        })),
                    )
                }),
            )
            .route(
                "/transactions/",
                post(|Json(body): Json<Value>| async move {
                    if body["rate"] == "rate_ok" {
                        Json(json!({
                            "object_id": "txn_1",
                            "status": "SUCCESS",
                            "label_url": "https://shippo-delivery.s3.amazonaws.com/label.pdf",
                            "tracking_number": "9400111899223197428490",
                            "tracking_url_provider": "https://tools.usps.com/go/TrackConfirmAction?tLabels=9400",
                            "rate": {"provider": "USPS", "amount": "7.35", "currency": "USD"}
                        }))
                    } else {
                        Json(json!({
                            "object_id": "txn_2",
                            "status": "ERROR",
                            "messages": [{"text": "Rate expired"}]
                        }))
                    }
                }),
            )
            .route(
                "/tracks/{carrier}/{number}",
                get(|Path((carrier, number)): Path<(String, String)>| async move {
                    if number == "UNKNOWN" {
                        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "tracking_number": number,
                            "carrier": carrier,
                            "tracking_status": {
                                "status": "TRANSIT",
                                "status_date": "2026-01-02T10:00:00Z",
                                "status_details": "In transit"
                            },
                            "tracking_history": []
                        })),
                    )
                }),
            );
        stub_server(router).await
    }

    fn shippo(base_url: String) -> ShippoProvider {
        ShippoProvider::with_base_url("shippo_test_key", Address::default(), base_url)
    }

    fn item(weight: f64, quantity: u32, length: Option<f64>) -> ShippingItem {
        ShippingItem {
            weight,
            quantity,
            value: 10.0,
            length,
            width: None,
            height: None,
        }
    }

    #[test]
    fn test_parcel_defaults_and_minimum_weight() {
        let parcel = Parcel::from_items(&[item(0.2, 2, None)]);
        assert_eq!(parcel.length, 6.0);
        assert_eq!(parcel.width, 4.0);
        assert_eq!(parcel.height, 3.0);
        assert_eq!(parcel.weight, 1.0);
        assert_eq!(parcel.insured_value, 20.0);
    }

    #[test]
    fn test_parcel_takes_largest_dimension() {
        let parcel = Parcel::from_items(&[item(4.0, 1, Some(2.0)), item(3.0, 2, Some(9.5))]);
        assert_eq!(parcel.length, 9.5);
        assert_eq!(parcel.weight, 10.0);
    }

    #[test]
    fn test_parcel_without_items() {
        let parcel = Parcel::from_items(&[]);
        assert_eq!(parcel.length, 6.0);
        assert_eq!(parcel.weight, 1.0);
    }

    #[test]
    fn test_mock_rates_are_usps() {
        let rates = flat_rates();
        assert_eq!(rates.len(), 3);
        assert!(rates.iter().all(|r| r.provider == "USPS"));
        assert_eq!(rates[2].servicelevel.token, "EXPRESS");
        assert_eq!(rates[2].estimated_days, 1);
    }

    #[test]
    fn test_parse_tracking() {
        let resp = json!({
            "tracking_number": "9400",
            "carrier": "usps",
            "eta": "2026-01-03T12:00:00Z",
            "tracking_status": {
                "status": "DELIVERED",
                "status_date": "2026-01-02T10:00:00Z",
                "status_details": "Delivered"
            },
            "tracking_history": [
                {"status": "TRANSIT", "status_date": "2026-01-01T10:00:00Z",
                 "status_details": "Accepted", "location": {"city": "Austin", "state": "TX"}}
            ]
        });
        let info = parse_tracking(&resp, "usps").unwrap();
        assert_eq!(info.status, "DELIVERED");
        assert!(info.eta.is_some());
        assert_eq!(info.tracking_history[0].location.as_deref(), Some("Austin, TX"));
    }

    #[test]
    fn test_parse_tracking_without_status() {
        assert!(parse_tracking(&json!({"tracking_number": "1"}), "usps").is_none());
    }

    #[test]
    fn test_shippo_error_detail() {
        assert!(check_error(&json!({"detail": "Invalid token."})).is_err());
        assert!(check_error(&json!({"rates": []})).is_ok());
    }

    #[tokio::test]
    async fn test_shippo_rates_send_parcel_in_inches_and_ounces() {
        let provider = shippo(fake_shippo().await);
        let rates = provider
            .get_rates(&Address::default(), &[item(4.0, 2, Some(9.5))])
            .await
            .unwrap();

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate_id, "rate_ok");
        assert_eq!(rates[0].amount, "7.35");
        assert_eq!(rates[0].estimated_days, 2);
        assert_eq!(rates[0].provider_image_75.as_deref(), Some("8oz/9.5in"));
    }

    #[tokio::test]
    async fn test_shippo_bad_token_is_vendor_error() {
        let provider = ShippoProvider::with_base_url("wrong", Address::default(), fake_shippo().await);
        let err = provider.get_rates(&Address::default(), &[]).await.unwrap_err();
        assert!(matches!(err, IntegrationError::Vendor { service: "shippo", .. }));
        assert!(err.to_string().contains("Invalid token."));
    }

    #[tokio::test]
    async fn test_shippo_label_purchase() {
        let label = shippo(fake_shippo().await)
            .create_label("rate_ok", "PB12345678")
            .await
            .unwrap();
        assert_eq!(label.carrier, "usps");
        assert_eq!(label.tracking_number, "9400111899223197428490");
        assert_eq!(label.cost, 7.35);
        assert_eq!(label.transaction_id.as_deref(), Some("txn_1"));
    }

    #[tokio::test]
    async fn test_shippo_failed_transaction_is_error() {
        let err = shippo(fake_shippo().await)
            .create_label("rate_stale", "PB12345678")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("transaction failed with status: ERROR"));
    }

    #[tokio::test]
    async fn test_shippo_track_found_and_unknown() {
        let provider = shippo(fake_shippo().await);

        let info = provider.track("9400", "usps").await.unwrap().unwrap();
        assert_eq!(info.tracking_number, "9400");
        assert_eq!(info.carrier, "usps");
        assert_eq!(info.status, "TRANSIT");

        assert!(provider.track("UNKNOWN", "usps").await.unwrap().is_none());
    }
}
