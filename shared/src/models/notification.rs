use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderConfirmation,
    #[default]
    OrderStatusUpdate,
    ShippingNotification,
    /// Caller-supplied subject and body, no template
    Custom,
}

/// Body of `POST /api/notifications-send`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub sent: bool,
    pub to: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults_to_status_update() {
        let req: SendNotificationRequest =
            serde_json::from_str(r#"{"to": "a@b.c", "orderId": "TPB-1"}"#).unwrap();
        assert_eq!(req.kind, NotificationKind::OrderStatusUpdate);
    }

    #[test]
    fn test_kind_wire_name() {
        let req: SendNotificationRequest =
            serde_json::from_str(r#"{"to": "a@b.c", "type": "shipping_notification"}"#).unwrap();
        assert_eq!(req.kind, NotificationKind::ShippingNotification);
    }
}
