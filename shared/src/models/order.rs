use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle labels
///
/// Any status may be set from any other; there is no transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PaymentConfirmed,
    InProduction,
    QualityCheck,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Position in the fulfillment sequence, starting at 0
    pub fn step(&self) -> u8 {
        match self {
            Self::PendingPayment => 0,
            Self::PaymentConfirmed => 1,
            Self::InProduction => 2,
            Self::QualityCheck => 3,
            Self::Shipped => 4,
            Self::Delivered => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::InProduction => "in_production",
            Self::QualityCheck => "quality_check",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Completion percentage shown on the tracking page
    pub fn progress(&self) -> u8 {
        (self.step() * 20 + 20).min(100)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(Self::PendingPayment),
            "payment_confirmed" => Ok(Self::PaymentConfirmed),
            "in_production" => Ok(Self::InProduction),
            "quality_check" => Ok(Self::QualityCheck),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub order_number: String,
    pub customer: Customer,
    pub status: OrderStatus,
    pub total: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Body of `POST /api/orders-create`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub pricing_id: Option<String>,
}

impl CreateOrderRequest {
    /// Contact details, preferring the nested `customer` object
    pub fn resolved_customer(&self) -> Customer {
        match (&self.customer, &self.customer_email) {
            (Some(customer), _) => customer.clone(),
            (None, Some(email)) => Customer {
                email: email.clone(),
                name: None,
                phone: None,
            },
            (None, None) => Customer {
                email: "customer@example.com".to_string(),
                name: None,
                phone: None,
            },
        }
    }
}

/// Body of `PUT /api/orders-status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStep {
    pub step: String,
    pub completed: bool,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    #[serde(flatten)]
    pub order: Order,
    pub progress: u8,
    pub estimated_completion: DateTime<Utc>,
    pub tracking_steps: Vec<TrackingStep>,
}

const TRACKING_STEPS: [(&str, i64); 5] = [
    ("Order Received", 60),
    ("Payment Confirmed", 50),
    ("In Production", 30),
    ("Quality Check", 15),
    ("Shipped", 5),
];

impl OrderTracking {
    /// Tracking view of an order as seen at `now`
    ///
    /// Completed steps carry a timestamp relative to `now`; the first step
    /// uses the order's creation time.
    pub fn from_order(order: Order, now: DateTime<Utc>) -> Self {
        let current = order.status.step();
        let tracking_steps = TRACKING_STEPS
            .iter()
            .enumerate()
            .map(|(index, (label, minutes_ago))| {
                let completed = current >= index as u8;
                let timestamp = match (index, completed) {
                    (0, _) => Some(order.created),
                    (_, true) => Some(now - Duration::minutes(*minutes_ago)),
                    (_, false) => None,
                };
                TrackingStep {
                    step: (*label).to_string(),
                    completed,
                    timestamp,
                }
            })
            .collect();

        Self {
            progress: order.status.progress(),
            estimated_completion: now + Duration::days(1),
            tracking_steps,
            order,
        }
    }
}
