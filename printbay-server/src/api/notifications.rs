//! Templated customer email

use axum::{Router, extract::State, routing::post};
use chrono::Utc;
use shared::models::{Notification, NotificationKind, SendNotificationRequest};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::api::JsonBody;
use crate::error::IntegrationResultExt;
use crate::integrations::EmailMessage;
use crate::state::AppState;

const DEFAULT_SUBJECT: &str = "Notification from The Printed Bay";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications-send", post(send_notification))
}

/// Plain-text part: the HTML with every `<...>` run removed
///
/// A `<` with no later `>` is ordinary text and is kept.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn wrap(heading: &str, body: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #2563eb;">{heading}</h2>
{body}
  <hr style="margin: 20px 0;">
  <p style="color: #666;">The Printed Bay Team</p>
</div>"#
    )
}

/// Subject and HTML body for a request
///
/// Templates apply only when an order id is present; otherwise the
/// caller's subject and message are sent as given.
pub fn render(req: &SendNotificationRequest) -> (String, String) {
    let message = req.message.as_deref().filter(|m| !m.is_empty());
    let order_id = req.order_id.as_deref().filter(|id| !id.is_empty());

    match (req.kind, order_id) {
        (NotificationKind::OrderConfirmation, Some(id)) => {
            let id = escape_html(id);
            (
                format!("Order Confirmation - {id}"),
                wrap(
                    "Order Confirmation",
                    &format!(
                        "  <p>Thank you for your order!</p>\n  <p><strong>Order ID:</strong> {id}</p>\n  <p>We've received your 3D printing request and will begin processing it shortly.</p>\n  <p>You'll receive updates as your order progresses through production.</p>"
                    ),
                ),
            )
        }
        (NotificationKind::OrderStatusUpdate, Some(id)) => {
            let subject = format!("Order Update - {}", escape_html(id));
            let html = match message {
                Some(message) => message.to_string(),
                None => wrap(
                    "Order Status Update",
                    &format!(
                        "  <p>Your order {} has been updated.</p>\n  <p>Please check your order status for the latest information.</p>",
                        escape_html(id)
                    ),
                ),
            };
            (subject, html)
        }
        (NotificationKind::ShippingNotification, Some(id)) => {
            let id = escape_html(id);
            let extra = message
                .map(|m| format!("\n  <p>{}</p>", escape_html(m)))
                .unwrap_or_default();
            (
                format!("Your Order Has Shipped - {id}"),
                wrap(
                    "Your Order Has Shipped!",
                    &format!(
                        "  <p>Great news! Your order {id} has been shipped.</p>{extra}\n  <p>You should receive it within the estimated delivery timeframe.</p>"
                    ),
                ),
            )
        }
        _ => (
            req.subject
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            message.unwrap_or_default().to_string(),
        ),
    }
}

/// POST /api/notifications-send
pub async fn send_notification(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SendNotificationRequest>,
) -> AppResult<ApiResponse<Notification>> {
    if req.to.trim().is_empty() || !req.to.contains('@') {
        return Err(AppError::validation("A valid recipient address is required"));
    }

    let (subject, html) = render(&req);
    let message = EmailMessage {
        to: req.to.clone(),
        subject: subject.clone(),
        text: strip_tags(&html),
        html,
    };
    tracing::info!(to = %req.to, kind = ?req.kind, "Sending notification");

    let message_id = state
        .mailer
        .send(&message)
        .await
        .or_app(ErrorCode::NotificationFailed)?;

    Ok(ApiResponse::success(Notification {
        notification_id: format!("notif_{}", shared::util::now_millis()),
        kind: req.kind,
        sent: true,
        to: req.to,
        subject,
        message_id,
        timestamp: Utc::now(),
    }))
}
