//! Local stand-ins for every API operation
//!
//! Used when the network call fails. Nothing generated here is persisted
//! anywhere. Pricing goes through the shared engine, so a simulated quote
//! matches what the server would charge; the other generators draw from
//! fixed ranges.

use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use shared::geometry::analyze_mesh;
use shared::models::analysis::{format_of, round_to};
use shared::models::payment::DEFAULT_INTENT_AMOUNT;
use shared::models::shipping::flat_rates;
use shared::models::{
    AnalysisSource, AnalyzeRequest, Complexity, CreateIntentRequest, CreateOrderRequest, Customer,
    Dimensions, ModelAnalysis, Notification, Order, OrderStatus, OrderTracking, Payment,
    PaymentIntent, PricingOptions, PricingQuote, PricingRequest, ProcessPaymentRequest,
    SendNotificationRequest, ShippingRate, UploadedFile, content_type_for,
};
use shared::pricing::{calculate_quote, pricing_options};
use shared::util::{order_number, timestamped_id};

use crate::config::SimulationDelays;
use crate::types::{OrderTimeline, PlacedOrder};

pub const FILES_BASE_URL: &str = "https://api.theprintedbay.com/files";
const CHECKOUT_BASE_URL: &str = "https://checkout.stripe.com/c/pay";
const TRACK_PAGE_URL: &str = "https://theprintedbay.com/track";

/// Delivery estimate when no quote accompanies the order
const DEFAULT_DELIVERY_DAYS: u32 = 3;
/// Order total when neither the quote nor the request carries one
const DEFAULT_ORDER_TOTAL: f64 = 24.25;
/// Total shown on simulated tracking pages
const TRACKED_ORDER_TOTAL: f64 = 25.99;

const DEFAULT_SUBJECT: &str = "Notification from The Printed Bay";

#[derive(Debug, Clone, Default)]
pub struct Simulator {
    delays: SimulationDelays,
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn sim_id() -> String {
    timestamped_id("sim", shared::util::now_millis())
}

/// Analysis derived from the file size alone
///
/// Complexity scales with size (one point per MB, capped at 5); everything
/// else is drawn from ranges around it.
pub fn generate_analysis(
    file_name: &str,
    file_size: u64,
    processing_time_ms: u64,
    rng: &mut impl Rng,
) -> ModelAnalysis {
    let complexity = (file_size as f64 / 1_000_000.0).min(5.0);
    let mut spread = |base: f64, per_point: f64, jitter: f64| {
        base + complexity * per_point + rng.gen_range(0.0..1.0) * jitter
    };

    let vertices = spread(10_000.0, 20_000.0, 15_000.0).floor() as u64;
    let faces = spread(5_000.0, 10_000.0, 8_000.0).floor() as u64;
    let edges = spread(15_000.0, 30_000.0, 12_000.0).floor() as u64;
    let volume = round_to(spread(5.0, 20.0, 15.0), 2);
    let surface_area = round_to(spread(50.0, 200.0, 100.0), 2);

    let dimensions = Dimensions::new(
        round_to(20.0 + rng.gen_range(0.0..80.0), 1),
        round_to(15.0 + rng.gen_range(0.0..60.0), 1),
        round_to(10.0 + rng.gen_range(0.0..40.0), 1),
    );

    let level = if complexity > 3.0 {
        Complexity::Complex
    } else if complexity > 1.5 {
        Complexity::Moderate
    } else {
        Complexity::Simple
    };

    let mut warnings = Vec::new();
    if complexity > 3.0 {
        warnings.push("High complexity model - longer print time expected".to_string());
    }
    for (threshold, warning) in [
        (0.7, "Thin walls detected - may require support"),
        (0.8, "Overhangs detected - supports recommended"),
        (0.9, "Model may require scaling for optimal print quality"),
    ] {
        if rng.gen_range(0.0..1.0) > threshold {
            warnings.push(warning.to_string());
        }
    }

    let mut recommendations = Vec::new();
    if complexity > 2.0 {
        recommendations.push("Consider using higher quality settings for better detail".to_string());
    }
    if rng.gen_range(0.0..1.0) > 0.6 {
        recommendations.push("PLA material recommended for this model".to_string());
    }
    if rng.gen_range(0.0..1.0) > 0.7 {
        recommendations.push("0.2mm layer height optimal for this model".to_string());
    }
    recommendations.push("Ensure proper bed adhesion for successful print".to_string());

    ModelAnalysis {
        id: sim_id(),
        file_name: file_name.to_string(),
        file_size,
        format: format_of(file_name),
        vertices,
        faces,
        edges,
        volume,
        surface_area,
        dimensions,
        complexity: level,
        support_needed: rng.gen_range(0.0..1.0) > 0.6,
        printable: rng.gen_range(0.0..1.0) > 0.05,
        warnings,
        recommendations,
        source: AnalysisSource::Estimated,
        processing_time_ms,
        timestamp: Utc::now(),
    }
}

fn tracked_order(order_id: &str, status: OrderStatus) -> Order {
    Order {
        order_id: order_id.to_string(),
        order_number: order_id.to_string(),
        customer: Customer {
            email: "test@example.com".into(),
            name: Some("Test User".into()),
            phone: None,
        },
        status,
        total: TRACKED_ORDER_TOTAL,
        currency: "USD".into(),
        file_url: None,
        file_name: None,
        created: Utc::now(),
        updated: None,
    }
}

impl Simulator {
    pub fn new(delays: SimulationDelays) -> Self {
        Self { delays }
    }

    pub async fn upload_file(&self, file_name: &str, file_size: u64) -> UploadedFile {
        pause(self.delays.upload).await;
        let file_id = sim_id();
        UploadedFile {
            upload_url: format!("{FILES_BASE_URL}/{file_id}"),
            file_id,
            file_name: file_name.to_string(),
            file_size,
            file_type: content_type_for(file_name).to_string(),
        }
    }

    /// Measures `bytes` when they parse as a mesh, otherwise estimates from
    /// the size
    pub async fn analyze(&self, req: &AnalyzeRequest, bytes: Option<&[u8]>) -> ModelAnalysis {
        pause(self.delays.analysis).await;

        if let Some(bytes) = bytes {
            let started = Instant::now();
            match analyze_mesh(bytes, &req.file_name) {
                Ok(stats) => {
                    return ModelAnalysis::from_mesh(
                        sim_id(),
                        req.file_name.clone(),
                        bytes.len() as u64,
                        &stats,
                        started.elapsed().as_millis() as u64,
                    );
                }
                Err(e) => {
                    tracing::debug!(file_name = %req.file_name, error = %e, "Mesh parse failed, estimating");
                }
            }
        }

        let file_size = bytes
            .map(|b| b.len() as u64)
            .or(req.file_size)
            .unwrap_or_default();
        generate_analysis(
            &req.file_name,
            file_size,
            self.delays.analysis.as_millis() as u64,
            &mut rand::thread_rng(),
        )
    }

    pub async fn price(&self, req: &PricingRequest) -> PricingQuote {
        pause(self.delays.pricing).await;
        calculate_quote(req)
    }

    pub async fn pricing_options(&self) -> PricingOptions {
        pricing_options()
    }

    pub async fn create_order(
        &self,
        req: &CreateOrderRequest,
        quote: Option<&PricingQuote>,
    ) -> PlacedOrder {
        pause(self.delays.order).await;

        let now = Utc::now();
        let millis = now.timestamp_millis();
        let number = order_number(millis);
        let days = i64::from(
            quote
                .map(|q| q.delivery.estimated_days)
                .unwrap_or(DEFAULT_DELIVERY_DAYS),
        );
        let total = quote
            .map(|q| q.breakdown.total)
            .or(req.total.filter(|t| *t > 0.0))
            .unwrap_or(DEFAULT_ORDER_TOTAL);

        let mut customer = req.resolved_customer();
        if customer.name.is_none() {
            customer.name = Some("Customer".into());
        }

        PlacedOrder {
            order: Order {
                order_id: timestamped_id("sim", millis),
                order_number: number.clone(),
                customer,
                status: OrderStatus::PendingPayment,
                total,
                currency: req.currency.clone(),
                file_url: req.file_url.clone(),
                file_name: req.file_name.clone(),
                created: now,
                updated: None,
            },
            timeline: Some(OrderTimeline {
                ordered: now,
                estimated_completion: now + chrono::Duration::days(days),
                estimated_shipping: now + chrono::Duration::days(days + 2),
            }),
            payment_url: Some(format!(
                "{CHECKOUT_BASE_URL}/sim_payment_{}",
                timestamped_id("sim", millis)
            )),
            tracking_url: Some(format!("{TRACK_PAGE_URL}#{number}")),
        }
    }

    pub async fn create_intent(&self, req: &CreateIntentRequest) -> PaymentIntent {
        let intent_id = format!("pi_sim_{}", sim_id());
        PaymentIntent {
            client_secret: format!("{intent_id}_secret_sim"),
            payment_intent_id: intent_id,
            amount: req.amount.filter(|a| *a > 0).unwrap_or(DEFAULT_INTENT_AMOUNT),
            currency: req.currency.clone(),
            status: "requires_payment_method".into(),
        }
    }

    /// Always succeeds
    pub async fn process_payment(&self, req: &ProcessPaymentRequest) -> Payment {
        pause(self.delays.payment).await;
        Payment {
            payment_id: sim_id(),
            order_id: req.order_id.clone().unwrap_or_else(|| "unknown".into()),
            amount: req.amount.unwrap_or(DEFAULT_INTENT_AMOUNT),
            currency: "usd".into(),
            status: "succeeded".into(),
            payment_intent_id: format!("pi_sim_{}", sim_id()),
            processed: Utc::now(),
        }
    }

    /// Static in-production record for any id
    pub async fn track_order(&self, order_id: &str) -> OrderTracking {
        OrderTracking::from_order(tracked_order(order_id, OrderStatus::InProduction), Utc::now())
    }

    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Order {
        let mut order = tracked_order(order_id, status);
        order.updated = Some(order.created);
        order
    }

    pub async fn shipping_rates(&self) -> Vec<ShippingRate> {
        flat_rates()
    }

    /// Nothing is delivered, so `sent` is false
    pub async fn notification(&self, req: &SendNotificationRequest) -> Notification {
        Notification {
            notification_id: format!("notif_{}", sim_id()),
            kind: req.kind,
            sent: false,
            to: req.to.clone(),
            subject: req
                .subject
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            message_id: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shared::models::DeliveryEstimate;

    fn simulator() -> Simulator {
        Simulator::new(SimulationDelays::none())
    }

    #[tokio::test]
    async fn test_upload_ids_and_url() {
        let file = simulator().upload_file("Benchy.STL", 2048).await;
        let parts: Vec<&str> = file.file_id.split('_').collect();
        assert_eq!(parts[0], "sim");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert_eq!(file.upload_url, format!("{FILES_BASE_URL}/{}", file.file_id));
        assert_eq!(file.file_type, "model/stl");
        assert_eq!(file.file_size, 2048);
    }

    #[test]
    fn test_size_based_analysis_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let small = generate_analysis("a.stl", 500_000, 0, &mut rng);
            assert!((20_000..=35_000).contains(&small.vertices));
            assert!(small.volume >= 15.0 && small.volume <= 30.0);
            assert_eq!(small.complexity, Complexity::Simple);
            assert!(small.dimensions.x >= 20.0 && small.dimensions.x <= 100.0);
            assert!(small.dimensions.z >= 10.0 && small.dimensions.z <= 50.0);
            assert_eq!(
                small.recommendations.last().map(String::as_str),
                Some("Ensure proper bed adhesion for successful print")
            );
        }
    }

    #[test]
    fn test_complexity_caps_at_five() {
        let mut rng = StdRng::seed_from_u64(1);
        let huge = generate_analysis("big.obj", 50_000_000, 0, &mut rng);
        assert_eq!(huge.complexity, Complexity::Complex);
        // 10k + 5 * 20k, plus at most 15k jitter
        assert!(huge.vertices >= 110_000 && huge.vertices < 125_000);
        assert_eq!(huge.warnings[0], "High complexity model - longer print time expected");
        assert_eq!(huge.format, "obj");
        assert_eq!(huge.source, AnalysisSource::Estimated);
    }

    #[tokio::test]
    async fn test_analysis_measures_supplied_mesh() {
        let obj = "v 0 0 0\nv 10 0 0\nv 0 10 0\nv 0 0 10\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n";
        let req = AnalyzeRequest {
            file_name: "tetra.obj".into(),
            ..Default::default()
        };
        let analysis = simulator().analyze(&req, Some(obj.as_bytes())).await;
        assert_eq!(analysis.source, AnalysisSource::Mesh);
        assert_eq!(analysis.faces, 4);
        assert_eq!(analysis.file_size, obj.len() as u64);
    }

    #[tokio::test]
    async fn test_unparseable_bytes_fall_back_to_estimate() {
        let req = AnalyzeRequest {
            file_name: "broken.stl".into(),
            file_size: Some(1),
            ..Default::default()
        };
        let analysis = simulator().analyze(&req, Some(b"garbage")).await;
        assert_eq!(analysis.source, AnalysisSource::Estimated);
        assert_eq!(analysis.file_size, 7);
    }

    #[tokio::test]
    async fn test_simulated_pricing_matches_engine() {
        let req = PricingRequest {
            volume: Some(42.0),
            material: "pla".into(),
            ..Default::default()
        };
        let first = simulator().price(&req).await;
        let second = simulator().price(&req).await;
        assert_eq!(first.breakdown, second.breakdown);
        assert_eq!(first.breakdown, calculate_quote(&req).breakdown);
    }

    #[tokio::test]
    async fn test_order_timeline_follows_quote() {
        let mut quote = calculate_quote(&PricingRequest::default());
        quote.delivery = DeliveryEstimate {
            estimated_days: 6,
            rush_available: true,
            rush_cost: 19.99,
        };
        let req = CreateOrderRequest {
            customer_email: Some("maker@example.com".into()),
            currency: "USD".into(),
            ..Default::default()
        };

        let placed = simulator().create_order(&req, Some(&quote)).await;
        let timeline = placed.timeline.unwrap();
        assert_eq!((timeline.estimated_completion - timeline.ordered).num_days(), 6);
        assert_eq!((timeline.estimated_shipping - timeline.ordered).num_days(), 8);
        assert_eq!(placed.order.total, quote.breakdown.total);
        assert_eq!(placed.order.status, OrderStatus::PendingPayment);
        assert_eq!(placed.order.customer.name.as_deref(), Some("Customer"));
        assert!(placed.order.order_number.starts_with("PB"));
        assert_eq!(placed.order.order_number.len(), 10);
        assert_eq!(
            placed.tracking_url.unwrap(),
            format!("{TRACK_PAGE_URL}#{}", placed.order.order_number)
        );
    }

    #[tokio::test]
    async fn test_order_without_quote() {
        let placed = simulator()
            .create_order(&CreateOrderRequest::default(), None)
            .await;
        let timeline = placed.timeline.unwrap();
        assert_eq!((timeline.estimated_completion - timeline.ordered).num_days(), 3);
        assert_eq!(placed.order.total, DEFAULT_ORDER_TOTAL);
    }

    #[tokio::test]
    async fn test_payment_always_succeeds() {
        let req = ProcessPaymentRequest {
            order_id: Some("TPB-1".into()),
            amount: Some(3100),
            ..Default::default()
        };
        let payment = simulator().process_payment(&req).await;
        assert_eq!(payment.status, "succeeded");
        assert!(payment.payment_intent_id.starts_with("pi_sim_"));
        assert_eq!(payment.amount, 3100);
        assert_eq!(payment.order_id, "TPB-1");
    }

    #[tokio::test]
    async fn test_tracking_is_in_production() {
        let tracking = simulator().track_order("PB12345678").await;
        assert_eq!(tracking.order.status, OrderStatus::InProduction);
        assert_eq!(tracking.order.order_number, "PB12345678");
        assert_eq!(tracking.progress, 60);
    }

    #[tokio::test]
    async fn test_notification_is_not_sent() {
        let req = SendNotificationRequest {
            to: "a@b.c".into(),
            ..Default::default()
        };
        let notification = simulator().notification(&req).await;
        assert!(!notification.sent);
        assert_eq!(notification.subject, DEFAULT_SUBJECT);
    }
}
