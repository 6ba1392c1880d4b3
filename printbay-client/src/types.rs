//! Client-side response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Order, ShippingRate};

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Network,
    Simulation,
}

/// A response together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Fetched<T> {
    pub fn network(value: T) -> Self {
        Self {
            value,
            source: Source::Network,
        }
    }

    pub fn simulated(value: T) -> Self {
        Self {
            value,
            source: Source::Simulation,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.source == Source::Simulation
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTimeline {
    pub ordered: DateTime<Utc>,
    pub estimated_completion: DateTime<Utc>,
    pub estimated_shipping: DateTime<Utc>,
}

/// Order as returned by order creation
///
/// The server returns the bare order; the simulated path also fills in the
/// timeline and checkout links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: Order,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<OrderTimeline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
}

/// Body of a successful `POST /api/shipping-rates`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RatesBody {
    pub rates: Vec<ShippingRate>,
}
