//! Order, quote, payment and shipping-label persistence

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::models::{Customer, Order, OrderStatus, Payment, PricingQuote, ShippingLabel};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::IntegrationError;

#[async_trait]
pub trait Database: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Round trip to the server, used by the health check
    async fn ping(&self) -> Result<(), IntegrationError>;

    async fn create_order(&self, order: &Order) -> Result<Order, IntegrationError>;

    /// `None` when the order does not exist
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, IntegrationError>;

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, IntegrationError>;

    async fn save_pricing(&self, quote: &PricingQuote) -> Result<PricingQuote, IntegrationError>;

    async fn save_payment(&self, payment: &Payment) -> Result<Payment, IntegrationError>;

    async fn save_shipping_label(
        &self,
        label: &ShippingLabel,
    ) -> Result<ShippingLabel, IntegrationError>;

    /// Most recent label for an order
    async fn get_shipping_info(
        &self,
        order_id: &str,
    ) -> Result<Option<ShippingLabel>, IntegrationError>;
}

// =============================================================================
// Mock
// =============================================================================

/// Unconfigured mode: fabricates records and persists nothing
#[derive(Debug, Default)]
pub struct MockDatabase;

impl MockDatabase {
    fn fabricated_order(order_id: &str, status: OrderStatus, now: DateTime<Utc>) -> Order {
        Order {
            order_id: order_id.to_string(),
            order_number: shared::util::order_number(now.timestamp_millis()),
            customer: Customer {
                email: "customer@example.com".into(),
                name: None,
                phone: None,
            },
            status,
            total: 24.25,
            currency: "USD".into(),
            file_url: None,
            file_name: None,
            created: now - Duration::hours(1),
            updated: Some(now),
        }
    }
}

#[async_trait]
impl Database for MockDatabase {
    fn is_configured(&self) -> bool {
        false
    }

    async fn ping(&self) -> Result<(), IntegrationError> {
        Ok(())
    }

    async fn create_order(&self, order: &Order) -> Result<Order, IntegrationError> {
        tracing::debug!(order_id = %order.order_id, "Mock database: order not persisted");
        Ok(order.clone())
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, IntegrationError> {
        Ok(Some(Self::fabricated_order(order_id, status, Utc::now())))
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, IntegrationError> {
        Ok(Some(Self::fabricated_order(
            order_id,
            OrderStatus::InProduction,
            Utc::now(),
        )))
    }

    async fn save_pricing(&self, quote: &PricingQuote) -> Result<PricingQuote, IntegrationError> {
        Ok(quote.clone())
    }

    async fn save_payment(&self, payment: &Payment) -> Result<Payment, IntegrationError> {
        Ok(payment.clone())
    }

    async fn save_shipping_label(
        &self,
        label: &ShippingLabel,
    ) -> Result<ShippingLabel, IntegrationError> {
        Ok(label.clone())
    }

    async fn get_shipping_info(
        &self,
        order_id: &str,
    ) -> Result<Option<ShippingLabel>, IntegrationError> {
        let now = Utc::now();
        let tracking_number = format!("TPB{}", now.timestamp_millis());
        Ok(Some(ShippingLabel {
            shipping_id: format!("ship_{}", now.timestamp_millis()),
            order_id: order_id.to_string(),
            carrier: "usps".into(),
            tracking_url: Some(format!(
                "https://mock-tracking.theprintedbay.com/{order_id}"
            )),
            tracking_number,
            label_url: format!("https://mock-label.theprintedbay.com/{order_id}.pdf"),
            cost: 8.99,
            currency: "USD".into(),
            rate_id: "mock_ground".into(),
            transaction_id: None,
            created: now - Duration::days(1),
        }))
    }
}

// =============================================================================
// PostgreSQL
// =============================================================================

pub struct PgDatabase {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    order_number: String,
    customer_email: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    status: String,
    total: f64,
    currency: String,
    file_url: Option<String>,
    file_name: Option<String>,
    created_at: i64,
    updated_at: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = IntegrationError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e: String| IntegrationError::vendor("postgres", e))?;
        Ok(Order {
            order_id: row.order_id,
            order_number: row.order_number,
            customer: Customer {
                email: row.customer_email,
                name: row.customer_name,
                phone: row.customer_phone,
            },
            status,
            total: row.total,
            currency: row.currency,
            file_url: row.file_url,
            file_name: row.file_name,
            created: from_millis(row.created_at),
            updated: row.updated_at.map(from_millis),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShippingLabelRow {
    shipping_id: String,
    order_id: String,
    carrier: String,
    tracking_number: String,
    tracking_url: Option<String>,
    label_url: String,
    cost: f64,
    currency: String,
    rate_id: String,
    transaction_id: Option<String>,
    created_at: i64,
}

impl From<ShippingLabelRow> for ShippingLabel {
    fn from(row: ShippingLabelRow) -> Self {
        ShippingLabel {
            shipping_id: row.shipping_id,
            order_id: row.order_id,
            carrier: row.carrier,
            tracking_number: row.tracking_number,
            tracking_url: row.tracking_url,
            label_url: row.label_url,
            cost: row.cost,
            currency: row.currency,
            rate_id: row.rate_id,
            transaction_id: row.transaction_id,
            created: from_millis(row.created_at),
        }
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

impl PgDatabase {
    /// Build a lazy pool and apply embedded migrations
    ///
    /// A server that is down at startup is not fatal: the pool connects on
    /// first use and the health check reports the failure.
    pub async fn connect(database_url: &str) -> Result<Self, IntegrationError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_lazy(database_url)?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::error!(error = %e, "Database migrations failed");
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for PgDatabase {
    fn is_configured(&self) -> bool {
        true
    }

    async fn ping(&self) -> Result<(), IntegrationError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_order(&self, order: &Order) -> Result<Order, IntegrationError> {
        sqlx::query(
            "INSERT INTO orders (order_id, order_number, customer_email, customer_name,
                customer_phone, status, total, currency, file_url, file_name, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&order.order_id)
        .bind(&order.order_number)
        .bind(&order.customer.email)
        .bind(&order.customer.name)
        .bind(&order.customer.phone)
        .bind(order.status.as_str())
        .bind(order.total)
        .bind(&order.currency)
        .bind(&order.file_url)
        .bind(&order.file_name)
        .bind(order.created.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(order.clone())
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, IntegrationError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE order_id = $3 RETURNING *",
        )
        .bind(status.as_str())
        .bind(shared::util::now_millis())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, IntegrationError> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn save_pricing(&self, quote: &PricingQuote) -> Result<PricingQuote, IntegrationError> {
        let b = &quote.breakdown;
        sqlx::query(
            "INSERT INTO pricing (pricing_id, order_id, material, color, quality,
                material_cost, labor_cost, support_cost, color_premium, post_processing_cost,
                service_fee, subtotal, tax, total, currency, estimated_days, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             ON CONFLICT (pricing_id) DO NOTHING",
        )
        .bind(&quote.id)
        .bind(&quote.order_id)
        .bind(&quote.material.name)
        .bind(&quote.material.color)
        .bind(&quote.material.quality)
        .bind(b.material_cost)
        .bind(b.labor_cost)
        .bind(b.support_cost)
        .bind(b.color_premium)
        .bind(b.post_processing_cost)
        .bind(b.service_fee)
        .bind(b.subtotal)
        .bind(b.tax)
        .bind(b.total)
        .bind(&quote.currency)
        .bind(quote.delivery.estimated_days as i32)
        .bind(quote.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(quote.clone())
    }

    async fn save_payment(&self, payment: &Payment) -> Result<Payment, IntegrationError> {
        sqlx::query(
            "INSERT INTO payments (payment_id, order_id, amount, currency, status,
                payment_intent_id, processed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (payment_id) DO UPDATE SET status = EXCLUDED.status,
                processed_at = EXCLUDED.processed_at",
        )
        .bind(&payment.payment_id)
        .bind(&payment.order_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.status)
        .bind(&payment.payment_intent_id)
        .bind(payment.processed.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(payment.clone())
    }

    async fn save_shipping_label(
        &self,
        label: &ShippingLabel,
    ) -> Result<ShippingLabel, IntegrationError> {
        sqlx::query(
            "INSERT INTO shipping_labels (shipping_id, order_id, carrier, tracking_number,
                tracking_url, label_url, cost, currency, rate_id, transaction_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&label.shipping_id)
        .bind(&label.order_id)
        .bind(&label.carrier)
        .bind(&label.tracking_number)
        .bind(&label.tracking_url)
        .bind(&label.label_url)
        .bind(label.cost)
        .bind(&label.currency)
        .bind(&label.rate_id)
        .bind(&label.transaction_id)
        .bind(label.created.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(label.clone())
    }

    async fn get_shipping_info(
        &self,
        order_id: &str,
    ) -> Result<Option<ShippingLabel>, IntegrationError> {
        let row: Option<ShippingLabelRow> = sqlx::query_as(
            "SELECT * FROM shipping_labels WHERE order_id = $1
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ShippingLabel::from))
    }
}
