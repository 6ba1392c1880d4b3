use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::Dimensions;

fn default_material() -> String {
    "standard-resin".to_string()
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_color() -> String {
    "white".to_string()
}

/// Body of `POST /api/pricing-calculate`
///
/// Geometry fields are optional; missing values fall back to the engine
/// defaults (10 cm^3, 30 mm cube).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    #[serde(default)]
    pub model_analysis_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default = "default_material")]
    pub material: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub support_needed: Option<bool>,
    #[serde(default)]
    pub delivery_option: Option<String>,
}

impl Default for PricingRequest {
    fn default() -> Self {
        Self {
            model_analysis_id: None,
            order_id: None,
            material: default_material(),
            quality: default_quality(),
            color: default_color(),
            volume: None,
            dimensions: None,
            support_needed: None,
            delivery_option: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub material_cost: f64,
    pub labor_cost: f64,
    pub support_cost: f64,
    pub color_premium: f64,
    pub post_processing_cost: f64,
    pub service_fee: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEstimate {
    pub estimated_days: u32,
    pub rush_available: bool,
    pub rush_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSummary {
    pub name: String,
    pub color: String,
    pub quality: String,
    /// grams
    pub estimated_weight: f64,
    pub waste_percentage: u32,
    pub supports_required: bool,
    /// low | medium | high
    pub complexity_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuote {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub breakdown: PriceBreakdown,
    pub delivery: DeliveryEstimate,
    pub material: MaterialSummary,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
}

// ========== Options catalog ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialOption {
    pub material_type: String,
    pub name: String,
    pub description: String,
    pub price_per_cm3: f64,
    pub lead_time_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOption {
    pub name: String,
    pub description: String,
    pub layer_height_mm: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    pub value: String,
    pub name: String,
    /// standard | premium | luxury
    pub category: String,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOption {
    pub key: String,
    pub name: String,
    pub days: u32,
    pub fee: f64,
}

/// Served by `GET /api/pricing-calculate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOptions {
    pub materials: Vec<MaterialOption>,
    pub qualities: Vec<QualityOption>,
    pub colors: Vec<ColorOption>,
    pub delivery_options: Vec<DeliveryOption>,
}
