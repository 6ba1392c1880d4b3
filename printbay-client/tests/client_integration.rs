//! Client against a live in-process server and against a dead port

use printbay_client::{
    ApiClient, ClientConfig, ClientError, FileCache, SimulationDelays, Source,
};
use printbay_server::{AppState, Config, build_app};
use shared::models::{
    CreateOrderRequest, HealthStatus, OrderStatus, PricingRequest, ProcessPaymentRequest,
    ShippingRatesRequest,
};
use shared::pricing::calculate_quote;

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(AppState::unconfigured(Config::for_tests()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Address nothing is listening on
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn client(base_url: String, fallback: bool) -> ApiClient {
    ApiClient::new(
        ClientConfig::new(base_url)
            .with_timeout(5)
            .with_fallback(fallback)
            .with_delays(SimulationDelays::none()),
    )
    .unwrap()
}

fn pricing_request() -> PricingRequest {
    PricingRequest {
        volume: Some(18.5),
        material: "tough-resin".into(),
        quality: "high".into(),
        color: "blue".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_network_pricing_matches_simulation() {
    let live = client(spawn_server().await, false);
    let offline = client(dead_url().await, true);
    let req = pricing_request();

    let network = live.calculate_pricing(&req).await.unwrap();
    let simulated = offline.calculate_pricing(&req).await.unwrap();

    assert_eq!(network.source, Source::Network);
    assert_eq!(simulated.source, Source::Simulation);
    assert_eq!(network.value.breakdown, simulated.value.breakdown);
    assert_eq!(network.value.breakdown, calculate_quote(&req).breakdown);
}

#[tokio::test]
async fn test_unreachable_server_falls_back() {
    let api = client(dead_url().await, true);

    let upload = api.upload_file("part.stl", b"solid x".to_vec()).await.unwrap();
    assert!(upload.is_simulated());
    assert!(upload.value.file_id.starts_with("sim_"));
    assert!(upload
        .value
        .upload_url
        .starts_with("https://api.theprintedbay.com/files/"));

    let order = api
        .create_order(&CreateOrderRequest::default(), None)
        .await
        .unwrap();
    assert!(order.is_simulated());
    assert!(order.value.payment_url.is_some());

    let payment = api
        .process_payment(&ProcessPaymentRequest {
            payment_intent_id: Some("pi_123".into()),
            order_id: Some(order.value.order.order_id.clone()),
            amount: Some(2425),
        })
        .await
        .unwrap();
    assert_eq!(payment.value.status, "succeeded");
    assert!(payment.value.payment_intent_id.starts_with("pi_sim_"));
}

#[tokio::test]
async fn test_unreachable_server_without_fallback_errors() {
    let api = client(dead_url().await, false);
    let err = api.calculate_pricing(&pricing_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    assert!(api.health().await.is_err());
}

#[tokio::test]
async fn test_rejected_upload_reports_api_error() {
    let api = client(spawn_server().await, false);
    let err = api
        .upload_file("notes.txt", b"hello".to_vec())
        .await
        .unwrap_err();
    match err {
        ClientError::Api { code, message } => {
            assert_eq!(code, Some(6502));
            assert!(message.starts_with("Unsupported file type"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_upload_falls_back_when_enabled() {
    let api = client(spawn_server().await, true);
    let upload = api.upload_file("notes.txt", b"hello".to_vec()).await.unwrap();
    assert_eq!(upload.source, Source::Simulation);
}

#[tokio::test]
async fn test_cached_file_upload_over_network() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::open(dir.path().join("files.redb")).unwrap();
    let id = cache
        .store_file("tri.obj", "model/obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
        .unwrap();

    let api = client(spawn_server().await, false);
    let upload = api.upload_cached_file(&cache, &id).await.unwrap();
    assert_eq!(upload.source, Source::Network);
    assert_eq!(upload.value.file_name, "tri.obj");
    assert!(upload.value.upload_url.starts_with("local://cache/"));

    assert!(matches!(
        api.upload_cached_file(&cache, "file_missing").await,
        Err(ClientError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_order_round_trip_over_network() {
    let api = client(spawn_server().await, false);

    let order = api
        .create_order(
            &CreateOrderRequest {
                customer_email: Some("maker@example.com".into()),
                currency: "USD".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(order.source, Source::Network);
    assert_eq!(order.value.order.status, OrderStatus::PendingPayment);
    assert!(order.value.timeline.is_none());

    let tracking = api.track_order(&order.value.order.order_id).await.unwrap();
    assert_eq!(tracking.source, Source::Network);
    assert_eq!(tracking.value.tracking_steps.len(), 5);

    let updated = api
        .update_order_status(&order.value.order.order_id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(updated.value.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_shipping_rates_and_health_over_network() {
    let api = client(spawn_server().await, false);

    let rates = api
        .shipping_rates(&ShippingRatesRequest::default())
        .await
        .unwrap();
    assert_eq!(rates.source, Source::Network);
    assert_eq!(rates.value.len(), 3);

    let health = api.health().await.unwrap();
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert_eq!(health.services.len(), 10);
}
