//! API client with simulation fallback
//!
//! Every operation calls the server first. A transport error, a non-2xx
//! status or a `success: false` envelope hands the call to the
//! [`Simulator`] when fallback is enabled; otherwise the error is returned.
//! Health is the exception: it never falls back.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::models::{
    AnalyzeRequest, CreateIntentRequest, CreateOrderRequest, HealthReport, ModelAnalysis,
    Notification, Order, OrderStatus, OrderTracking, Payment, PaymentIntent, PricingOptions,
    PricingQuote, PricingRequest, ProcessPaymentRequest, SendNotificationRequest, ShippingRate,
    ShippingRatesRequest, UpdateOrderStatusRequest, UploadedFile, content_type_for,
};

use crate::file_cache::FileCache;
use crate::simulation::Simulator;
use crate::types::{Fetched, PlacedOrder, RatesBody};
use crate::{ClientConfig, ClientError, ClientResult};

const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// Decode a `{success, ...}` envelope into `T`
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    let value: Value = serde_json::from_str(body)?;
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(serde_json::from_value(value)?),
        Some(false) => Err(api_error(&value)),
        None => Err(ClientError::InvalidResponse(
            "missing success flag".to_string(),
        )),
    }
}

fn api_error(value: &Value) -> ClientError {
    ClientError::Api {
        code: value
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok()),
        message: value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// HTTP client for the storefront API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    simulator: Simulator,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            simulator: Simulator::new(config.delays),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<Value>(&body) {
                Ok(value) if value.get("success").is_some() => api_error(&value),
                _ => ClientError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }
        parse_envelope(&body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.get(self.config.url(path))).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.client.post(self.config.url(path)).json(body))
            .await
    }

    /// Network result, or the simulated one when allowed
    async fn with_fallback<T>(
        &self,
        operation: &'static str,
        network: ClientResult<T>,
        simulate: impl Future<Output = T>,
    ) -> ClientResult<Fetched<T>> {
        match network {
            Ok(value) => {
                tracing::debug!(operation, "API call succeeded");
                Ok(Fetched::network(value))
            }
            Err(e) if self.config.fallback_enabled => {
                tracing::warn!(operation, error = %e, "API call failed, falling back to simulation");
                Ok(Fetched::simulated(simulate.await))
            }
            Err(e) => {
                tracing::error!(operation, error = %e, "API call failed and simulation fallback is disabled");
                Err(e)
            }
        }
    }

    // ========== Files ==========

    /// POST /api/files-upload
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Fetched<UploadedFile>> {
        let size = bytes.len() as u64;
        let metadata = serde_json::json!({
            "originalName": file_name,
            "size": size,
            "type": content_type_for(file_name),
        });
        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            )
            .text("metadata", metadata.to_string());

        let mut request = self
            .client
            .post(self.config.url("/api/files-upload"))
            .multipart(form);
        if let Some(customer_id) = &self.config.customer_id {
            request = request.header(CUSTOMER_ID_HEADER, customer_id);
        }

        let network = self.send(request).await;
        self.with_fallback(
            "FileUpload",
            network,
            self.simulator.upload_file(file_name, size),
        )
        .await
    }

    /// Upload a file held in the local cache
    ///
    /// Reading it counts as an access, which keeps it out of the next
    /// cleanup sweep.
    pub async fn upload_cached_file(
        &self,
        cache: &FileCache,
        file_id: &str,
    ) -> ClientResult<Fetched<UploadedFile>> {
        let file = cache.get_file(file_id)?.ok_or_else(|| {
            ClientError::InvalidResponse(format!("file {file_id} is not in the cache"))
        })?;
        self.upload_file(&file.meta.name, file.data).await
    }

    /// POST /api/models-analyze
    ///
    /// `bytes`, when given, lets the simulated path measure the mesh.
    pub async fn analyze_model(
        &self,
        req: &AnalyzeRequest,
        bytes: Option<&[u8]>,
    ) -> ClientResult<Fetched<ModelAnalysis>> {
        let network = self.post("/api/models-analyze", req).await;
        self.with_fallback("ModelAnalysis", network, self.simulator.analyze(req, bytes))
            .await
    }

    // ========== Pricing ==========

    /// POST /api/pricing-calculate
    pub async fn calculate_pricing(
        &self,
        req: &PricingRequest,
    ) -> ClientResult<Fetched<PricingQuote>> {
        let network = self.post("/api/pricing-calculate", req).await;
        self.with_fallback("PricingCalculation", network, self.simulator.price(req))
            .await
    }

    /// GET /api/pricing-calculate
    pub async fn pricing_options(&self) -> ClientResult<Fetched<PricingOptions>> {
        let network = self.get("/api/pricing-calculate").await;
        self.with_fallback(
            "GetPricingOptions",
            network,
            self.simulator.pricing_options(),
        )
        .await
    }

    // ========== Orders ==========

    /// POST /api/orders-create
    ///
    /// `quote` drives the simulated total and timeline.
    pub async fn create_order(
        &self,
        req: &CreateOrderRequest,
        quote: Option<&PricingQuote>,
    ) -> ClientResult<Fetched<PlacedOrder>> {
        let network = self.post("/api/orders-create", req).await;
        self.with_fallback(
            "OrderCreation",
            network,
            self.simulator.create_order(req, quote),
        )
        .await
    }

    /// GET /api/orders-status/{order_id}
    pub async fn track_order(&self, order_id: &str) -> ClientResult<Fetched<OrderTracking>> {
        let network = self.get(&format!("/api/orders-status/{order_id}")).await;
        self.with_fallback("TrackOrder", network, self.simulator.track_order(order_id))
            .await
    }

    /// PUT /api/orders-status/{order_id}
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<Fetched<Order>> {
        let request = self
            .client
            .put(self.config.url(&format!("/api/orders-status/{order_id}")))
            .json(&UpdateOrderStatusRequest { status });
        let network = self.send(request).await;
        self.with_fallback(
            "UpdateOrderStatus",
            network,
            self.simulator.update_status(order_id, status),
        )
        .await
    }

    // ========== Payments ==========

    /// POST /api/payments-create-intent
    pub async fn create_payment_intent(
        &self,
        req: &CreateIntentRequest,
    ) -> ClientResult<Fetched<PaymentIntent>> {
        let network = self.post("/api/payments-create-intent", req).await;
        self.with_fallback(
            "CreatePaymentIntent",
            network,
            self.simulator.create_intent(req),
        )
        .await
    }

    /// POST /api/payments-process
    pub async fn process_payment(
        &self,
        req: &ProcessPaymentRequest,
    ) -> ClientResult<Fetched<Payment>> {
        let network = self.post("/api/payments-process", req).await;
        self.with_fallback(
            "PaymentProcessing",
            network,
            self.simulator.process_payment(req),
        )
        .await
    }

    // ========== Shipping and notifications ==========

    /// POST /api/shipping-rates
    pub async fn shipping_rates(
        &self,
        req: &ShippingRatesRequest,
    ) -> ClientResult<Fetched<Vec<ShippingRate>>> {
        let network = self
            .post::<RatesBody, _>("/api/shipping-rates", req)
            .await
            .map(|body| body.rates);
        self.with_fallback("ShippingRates", network, self.simulator.shipping_rates())
            .await
    }

    /// POST /api/notifications-send
    pub async fn send_notification(
        &self,
        req: &SendNotificationRequest,
    ) -> ClientResult<Fetched<Notification>> {
        let network = self.post("/api/notifications-send", req).await;
        self.with_fallback(
            "SendNotification",
            network,
            self.simulator.notification(req),
        )
        .await
    }

    /// GET /api/health
    pub async fn health(&self) -> ClientResult<HealthReport> {
        self.get("/api/health").await
    }
}
