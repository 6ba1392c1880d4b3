use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default intent amount in cents when the request carries none
pub const DEFAULT_INTENT_AMOUNT: i64 = 2425;

fn default_currency() -> String {
    "usd".to_string()
}

/// Body of `POST /api/payments-create-intent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub order_id: Option<String>,
    /// Minor units (cents)
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    /// Vendor status, e.g. `requires_payment_method` or `succeeded`
    #[serde(default)]
    pub status: String,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// Body of `POST /api/payments-process`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Used by the simulated path only
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: String,
    pub order_id: String,
    /// Minor units (cents)
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub payment_intent_id: String,
    pub processed: DateTime<Utc>,
}

impl Payment {
    pub fn from_intent(intent: &PaymentIntent, order_id: impl Into<String>) -> Self {
        Self {
            payment_id: intent.payment_intent_id.clone(),
            order_id: order_id.into(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            status: intent.status.clone(),
            payment_intent_id: intent.payment_intent_id.clone(),
            processed: Utc::now(),
        }
    }
}
