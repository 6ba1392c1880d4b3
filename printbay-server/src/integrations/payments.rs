//! Payment intents via the Stripe REST API (no SDK dependency)

use async_trait::async_trait;
use shared::models::PaymentIntent;

use crate::error::IntegrationError;
use crate::integrations::endpoint;

pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Amount is in minor units
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        order_id: &str,
    ) -> Result<PaymentIntent, IntegrationError>;

    /// `None` when the gateway has no intent with this id
    async fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentIntent>, IntegrationError>;
}

/// Unconfigured mode
#[derive(Debug, Default)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn is_configured(&self) -> bool {
        false
    }

    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        order_id: &str,
    ) -> Result<PaymentIntent, IntegrationError> {
        let id = format!("pi_mock_{}", shared::util::now_millis());
        tracing::debug!(order_id = %order_id, intent_id = %id, "Mock payment intent");
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret"),
            payment_intent_id: id,
            amount,
            currency: currency.to_string(),
            status: "requires_payment_method".into(),
        })
    }

    async fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentIntent>, IntegrationError> {
        Ok(Some(PaymentIntent {
            client_secret: format!("{intent_id}_secret"),
            payment_intent_id: intent_id.to_string(),
            amount: shared::models::payment::DEFAULT_INTENT_AMOUNT,
            currency: "usd".into(),
            status: "succeeded".into(),
        }))
    }
}

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE)
    }

    /// Point at a different API host (used against local fakes)
    pub fn with_base_url(secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Stripe reports failures as `{"error": {"message": ...}}`
fn parse_intent(resp: &serde_json::Value) -> Result<PaymentIntent, IntegrationError> {
    if let Some(message) = resp["error"]["message"].as_str() {
        return Err(IntegrationError::vendor("stripe", message));
    }
    let id = resp["id"]
        .as_str()
        .ok_or_else(|| IntegrationError::vendor("stripe", format!("missing intent id: {resp}")))?;
    Ok(PaymentIntent {
        client_secret: resp["client_secret"].as_str().unwrap_or_default().to_string(),
        payment_intent_id: id.to_string(),
        amount: resp["amount"].as_i64().unwrap_or_default(),
        currency: resp["currency"].as_str().unwrap_or("usd").to_string(),
        status: resp["status"].as_str().unwrap_or_default().to_string(),
    })
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn is_configured(&self) -> bool {
        true
    }

    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        order_id: &str,
    ) -> Result<PaymentIntent, IntegrationError> {
        let amount = amount.to_string();
        let resp: serde_json::Value = self
            .client
            .post(endpoint("stripe", &self.base_url, &["v1", "payment_intents"])?)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("automatic_payment_methods[enabled]", "true"),
                ("metadata[orderId]", order_id),
                ("metadata[source]", "theprintedbay_web"),
            ])
            .send()
            .await?
            .json()
            .await?;

        parse_intent(&resp)
    }

    async fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentIntent>, IntegrationError> {
        let resp = self
            .client
            .get(endpoint("stripe", &self.base_url, &["v1", "payment_intents", intent_id])?)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp: serde_json::Value = resp.json().await?;
        parse_intent(&resp).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::test_support::stub_server;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Form, Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn intent_json(id: &str, amount: &str, order_id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "client_secret": format!("{id}_secret_abc"),
            "amount": amount.parse::<i64>().unwrap_or_default(),
            "currency": "usd",
            "status": status,
            "metadata": {"orderId": order_id},
        })
    }

    /// Minimal Stripe: echoes form fields back and knows one intent
    async fn fake_stripe() -> String {
        let router = Router::new()
            .route(
                "/v1/payment_intents",
                post(
                    |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| async move {
                        let authorized = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .is_some_and(|v| v.starts_with("Basic "));
                        if !authorized {
                            return (
                                StatusCode::UNAUTHORIZED,
                                Json(json!({"error": {"message": "No API key provided"}})),
                            );
                        }
                        let field = |k: &str| form.get(k).cloned().unwrap_or_default();
                        let mut body = intent_json(
                            "pi_fake_1",
                            &field("amount"),
                            &field("metadata[orderId]"),
                            "requires_payment_method",
                        );
                        body["currency"] = json!(field("currency"));
                        body["automatic"] = json!(field("automatic_payment_methods[enabled]"));
                        (StatusCode::OK, Json(body))
                    },
                ),
            )
            .route(
                "/v1/payment_intents/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "pi_missing" {
                        (
                            StatusCode::NOT_FOUND,
                            Json(json!({"error": {"message": "No such payment_intent"}})),
                        )
                    } else {
                        (StatusCode::OK, Json(intent_json(&id, "2425", "PB1", "succeeded")))
                    }
                }),
            )
            .route(
                "/v1/customers/{id}",
                get(|| async { Json(json!({"id": "cus_1", "object": "customer"})) }),
            );
        stub_server(router).await
    }

    #[test]
    fn test_parse_intent() {
        let intent = parse_intent(&json!({
            "id": "pi_123",
            "client_secret": "pi_123_secret_abc",
            "amount": 2425,
            "currency": "usd",
            "status": "requires_payment_method"
        }))
        .unwrap();
        assert_eq!(intent.payment_intent_id, "pi_123");
        assert_eq!(intent.amount, 2425);
        assert!(!intent.is_succeeded());
    }

    #[test]
    fn test_parse_intent_error_body() {
        let err = parse_intent(&json!({"error": {"message": "No such payment_intent"}})).unwrap_err();
        assert!(err.to_string().contains("No such payment_intent"));
    }

    #[tokio::test]
    async fn test_mock_retrieve_succeeds() {
        let intent = MockPaymentGateway
            .retrieve_intent("pi_x")
            .await
            .unwrap()
            .unwrap();
        assert!(intent.is_succeeded());
        assert_eq!(intent.amount, 2425);
    }

    #[tokio::test]
    async fn test_stripe_create_intent_sends_form_fields() {
        let stripe = StripeGateway::with_base_url("sk_test_123", fake_stripe().await);
        let intent = stripe.create_intent(1999, "eur", "PB42").await.unwrap();

        assert_eq!(intent.payment_intent_id, "pi_fake_1");
        assert_eq!(intent.client_secret, "pi_fake_1_secret_abc");
        assert_eq!(intent.amount, 1999);
        assert_eq!(intent.currency, "eur");
        assert_eq!(intent.status, "requires_payment_method");
    }

    #[tokio::test]
    async fn test_stripe_error_body_is_vendor_error() {
        let base = stub_server(Router::new().route(
            "/v1/payment_intents",
            post(|| async {
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({"error": {"message": "Your card was declined."}})),
                )
            }),
        ))
        .await;
        let err = StripeGateway::with_base_url("sk_test_123", base)
            .create_intent(2425, "usd", "PB1")
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Vendor { service: "stripe", .. }));
        assert!(err.to_string().contains("declined"));
    }

    #[tokio::test]
    async fn test_stripe_retrieve_found_and_missing() {
        let stripe = StripeGateway::with_base_url("sk_test_123", fake_stripe().await);

        let intent = stripe.retrieve_intent("pi_abc").await.unwrap().unwrap();
        assert_eq!(intent.payment_intent_id, "pi_abc");
        assert!(intent.is_succeeded());

        assert!(stripe.retrieve_intent("pi_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stripe_retrieve_stays_on_intent_route() {
        let stripe = StripeGateway::with_base_url("sk_test_123", fake_stripe().await);
        let intent = stripe
            .retrieve_intent("../customers/cus_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(intent.payment_intent_id, "../customers/cus_1");
    }
}
