use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub street1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One parcel line; weight in ounces, dimensions in inches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingItem {
    pub weight: f64,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

fn one() -> u32 {
    1
}

/// Body of `POST /api/shipping-rates`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRatesRequest {
    #[serde(default)]
    pub to_address: Address,
    #[serde(default)]
    pub items: Vec<ShippingItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLevel {
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub rate_id: String,
    pub servicelevel: ServiceLevel,
    /// Decimal string as quoted by the carrier, e.g. `"8.99"`
    pub amount: String,
    pub currency: String,
    pub estimated_days: u32,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_image_75: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_image_200: Option<String>,
}

const USPS_IMAGE_75: &str = "https://shippo-static.s3.amazonaws.com/providers/75/USPS.png";
const USPS_IMAGE_200: &str = "https://shippo-static.s3.amazonaws.com/providers/200/USPS.png";

/// Fixed USPS rate card quoted when no carrier account is reachable
pub fn flat_rates() -> Vec<ShippingRate> {
    [
        ("mock_ground", "Ground", "GROUND", "8.99", 5),
        ("mock_priority", "Priority Mail", "PRIORITY", "14.99", 3),
        ("mock_express", "Priority Express", "EXPRESS", "24.99", 1),
    ]
    .into_iter()
    .map(|(rate_id, name, token, amount, days)| ShippingRate {
        rate_id: rate_id.into(),
        servicelevel: ServiceLevel {
            name: name.into(),
            token: token.into(),
        },
        amount: amount.into(),
        currency: "USD".into(),
        estimated_days: days,
        provider: "USPS".into(),
        provider_image_75: Some(USPS_IMAGE_75.into()),
        provider_image_200: Some(USPS_IMAGE_200.into()),
    })
    .collect()
}

/// Body of `POST /api/shipping-label`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub rate_id: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLabel {
    pub shipping_id: String,
    pub order_id: String,
    pub carrier: String,
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    pub label_url: String,
    pub cost: f64,
    pub currency: String,
    pub rate_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub status: String,
    pub status_date: Option<DateTime<Utc>>,
    pub status_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub carrier: String,
    pub status: String,
    pub status_date: Option<DateTime<Utc>>,
    pub status_details: String,
    pub eta: Option<DateTime<Utc>>,
    pub tracking_history: Vec<TrackingEvent>,
}
