//! Domain models
//!
//! Plain serde records exchanged over the HTTP API. Field names serialize
//! in camelCase.

pub mod analysis;
pub mod file;
pub mod health;
pub mod notification;
pub mod order;
pub mod payment;
pub mod quote;
pub mod shipping;

pub use analysis::{AnalysisSource, AnalyzeRequest, Complexity, Dimensions, ModelAnalysis};
pub use file::{
    SUPPORTED_EXTENSIONS, UploadedFile, content_type_for, file_extension, is_supported_model,
};
pub use health::{HealthReport, HealthStatus, ServiceHealth};
pub use notification::{Notification, NotificationKind, SendNotificationRequest};
pub use order::{
    CreateOrderRequest, Customer, Order, OrderStatus, OrderTracking, TrackingStep,
    UpdateOrderStatusRequest,
};
pub use payment::{CreateIntentRequest, Payment, PaymentIntent, ProcessPaymentRequest};
pub use quote::{
    ColorOption, DeliveryEstimate, DeliveryOption, MaterialOption, MaterialSummary,
    PriceBreakdown, PricingOptions, PricingQuote, PricingRequest, QualityOption,
};
pub use shipping::{
    Address, CreateLabelRequest, ServiceLevel, ShippingItem, ShippingLabel, ShippingRate,
    ShippingRatesRequest, TrackingEvent, TrackingInfo,
};
