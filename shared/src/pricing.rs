//! Pricing engine
//!
//! Deterministic quote arithmetic over static lookup tables. Values are
//! computed in `Decimal` and rounded half-away-from-zero to cents only when
//! written into the quote. The complexity multiplier is seeded by a hash of
//! the inputs, so identical requests always price identically.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;

use crate::models::{
    ColorOption, DeliveryEstimate, DeliveryOption, Dimensions, MaterialOption, MaterialSummary,
    PriceBreakdown, PricingOptions, PricingQuote, PricingRequest, QualityOption,
};
use crate::util::string_hash;

const DECIMAL_PLACES: u32 = 2;

/// Volume used when the request carries none (cm^3)
pub const DEFAULT_VOLUME: f64 = 10.0;
/// Bounding box used when the request carries none (mm)
pub const DEFAULT_DIMENSIONS: Dimensions = Dimensions::new(30.0, 30.0, 30.0);

const MATERIALS: [(&str, &str, &str, i64, u32); 9] = [
    ("standard-resin", "Standard Resin", "General purpose resin", 22, 3),
    ("tough-resin", "Tough Resin", "High strength resin", 30, 5),
    ("flexible-resin", "Flexible Resin", "Rubber-like elastic resin", 45, 5),
    ("clear-resin", "Clear Resin", "Transparent resin", 28, 4),
    ("ceramic-resin", "Ceramic Resin", "Heat resistant ceramic-filled resin", 55, 7),
    ("pla", "PLA", "Easy to print thermoplastic", 12, 3),
    ("abs", "ABS", "Impact resistant thermoplastic", 15, 3),
    ("petg", "PETG", "Durable food-safe thermoplastic", 18, 3),
    ("tpu", "TPU", "Flexible thermoplastic", 35, 5),
];

// (name, description, layer height in 0.01 mm, multiplier in hundredths)
const QUALITIES: [(&str, &str, i64, i64); 4] = [
    ("draft", "Draft quality", 30, 85),
    ("standard", "Standard quality", 20, 115),
    ("high", "High quality", 10, 155),
    ("ultra", "Ultra quality", 5, 225),
];

const COLORS: [(&str, &str, &str, i64); 12] = [
    ("white", "White", "standard", 0),
    ("black", "Black", "standard", 2),
    ("gray", "Gray", "standard", 2),
    ("clear", "Clear", "premium", 20),
    ("red", "Red", "premium", 8),
    ("blue", "Blue", "premium", 8),
    ("green", "Green", "premium", 8),
    ("yellow", "Yellow", "premium", 12),
    ("orange", "Orange", "premium", 12),
    ("purple", "Purple", "premium", 15),
    ("gold-glitter", "Gold Glitter", "luxury", 35),
    ("silver-glitter", "Silver Glitter", "luxury", 30),
];

#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Price per cm^3 for a material key
pub fn material_price(material: &str) -> Decimal {
    MATERIALS
        .iter()
        .find(|(key, ..)| *key == material)
        .map(|(.., cents, _)| Decimal::new(*cents, 2))
        .unwrap_or_else(|| Decimal::new(15, 2))
}

pub fn quality_multiplier(quality: &str) -> Decimal {
    QUALITIES
        .iter()
        .find(|(key, ..)| *key == quality)
        .map(|(.., hundredths)| Decimal::new(*hundredths, 2))
        .unwrap_or(Decimal::ONE)
}

/// Color premium as a fraction of the base material cost
pub fn color_premium(color: &str) -> Decimal {
    COLORS
        .iter()
        .find(|(key, ..)| *key == color)
        .map(|(.., hundredths)| Decimal::new(*hundredths, 2))
        .unwrap_or(Decimal::ZERO)
}

/// Hash-seeded complexity multiplier: 1.0, 1.2 or 1.5
pub fn complexity_factor(hash: i32) -> Decimal {
    let bucket = (hash % 100).abs();
    if bucket > 70 {
        Decimal::new(15, 1)
    } else if bucket > 30 {
        Decimal::new(12, 1)
    } else {
        Decimal::ONE
    }
}

/// Normalized engine inputs
#[derive(Debug, Clone, PartialEq)]
pub struct PricingInput<'a> {
    pub volume: f64,
    pub dimensions: Dimensions,
    pub support_hint: bool,
    pub material: &'a str,
    pub quality: &'a str,
    pub color: &'a str,
}

impl<'a> From<&'a PricingRequest> for PricingInput<'a> {
    fn from(req: &'a PricingRequest) -> Self {
        let volume = req
            .volume
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_VOLUME);
        Self {
            volume,
            dimensions: req.dimensions.unwrap_or(DEFAULT_DIMENSIONS),
            support_hint: req.support_needed.unwrap_or(false),
            material: &req.material,
            quality: &req.quality,
            color: &req.color,
        }
    }
}

impl PricingInput<'_> {
    /// Seed string for the complexity hash
    pub fn hash_key(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.volume, self.material, self.quality, self.color
        )
    }

    pub fn needs_supports(&self) -> bool {
        let d = self.dimensions;
        self.support_hint || d.z > d.x.max(d.y) * 1.5 || self.volume > 20.0
    }
}

/// Price a request at the current time
pub fn calculate_quote(request: &PricingRequest) -> PricingQuote {
    calculate_quote_at(request, Utc::now())
}

/// Price a request, stamping the quote with `now`
pub fn calculate_quote_at(request: &PricingRequest, now: DateTime<Utc>) -> PricingQuote {
    let input = PricingInput::from(request);
    let hash = string_hash(&input.hash_key());
    let complexity = complexity_factor(hash);
    let high_complexity = complexity > Decimal::new(13, 1);
    let supports = input.needs_supports();

    let volume = to_decimal(input.volume);

    let support_cost = if supports {
        let base = Decimal::new(450, 2).max(volume * Decimal::new(15, 2));
        if high_complexity {
            base * Decimal::new(14, 1)
        } else {
            base
        }
    } else {
        Decimal::ZERO
    };

    let base_material_cost = volume * material_price(input.material);
    let material_cost = base_material_cost * quality_multiplier(input.quality) * complexity;
    let color_cost = base_material_cost * color_premium(input.color);

    let labor_cost = if high_complexity {
        Decimal::new(1250, 2) * Decimal::new(13, 1)
    } else {
        Decimal::new(1250, 2)
    };

    let post_processing_cost = match input.quality {
        "ultra" => Decimal::new(600, 2),
        "high" => Decimal::new(350, 2),
        _ => Decimal::ZERO,
    };

    let service_fee = Decimal::new(695, 2);
    let subtotal = material_cost + labor_cost + support_cost + color_cost + post_processing_cost;
    let tax = subtotal * Decimal::new(875, 4);
    let total = subtotal + service_fee + tax;

    let estimated_days = match input.quality {
        "ultra" => 8,
        "high" => 6,
        _ if supports => 5,
        _ if high_complexity => 4,
        _ => 3,
    };

    let complexity_level = if high_complexity {
        "high"
    } else if complexity > Decimal::new(11, 1) {
        "medium"
    } else {
        "low"
    };

    let weight = (volume * Decimal::new(12, 1))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default();

    PricingQuote {
        id: format!(
            "pricing_{}_{}",
            i64::from(hash).abs(),
            now.timestamp_millis()
        ),
        order_id: request.order_id.clone(),
        breakdown: PriceBreakdown {
            material_cost: to_f64(material_cost),
            labor_cost: to_f64(labor_cost),
            support_cost: to_f64(support_cost),
            color_premium: to_f64(color_cost),
            post_processing_cost: to_f64(post_processing_cost),
            service_fee: to_f64(service_fee),
            subtotal: to_f64(subtotal),
            tax: to_f64(tax),
            total: to_f64(total),
        },
        delivery: DeliveryEstimate {
            estimated_days,
            rush_available: estimated_days > 3,
            rush_cost: if estimated_days > 3 { 19.99 } else { 0.0 },
        },
        material: MaterialSummary {
            name: input.material.to_string(),
            color: input.color.to_string(),
            quality: input.quality.to_string(),
            estimated_weight: weight,
            waste_percentage: if supports { 18 } else { 10 },
            supports_required: supports,
            complexity_level: complexity_level.to_string(),
        },
        currency: "USD".to_string(),
        timestamp: now,
    }
}

/// Catalog served to the configurator
pub fn pricing_options() -> PricingOptions {
    PricingOptions {
        materials: MATERIALS
            .iter()
            .map(|(key, name, description, cents, lead)| MaterialOption {
                material_type: (*key).to_string(),
                name: (*name).to_string(),
                description: (*description).to_string(),
                price_per_cm3: to_f64(Decimal::new(*cents, 2)),
                lead_time_days: *lead,
            })
            .collect(),
        qualities: QUALITIES
            .iter()
            .map(|(key, description, layer, mult)| QualityOption {
                name: (*key).to_string(),
                description: (*description).to_string(),
                layer_height_mm: to_f64(Decimal::new(*layer, 2)),
                multiplier: to_f64(Decimal::new(*mult, 2)),
            })
            .collect(),
        colors: COLORS
            .iter()
            .map(|(key, name, category, premium)| ColorOption {
                value: (*key).to_string(),
                name: (*name).to_string(),
                category: (*category).to_string(),
                premium: to_f64(Decimal::new(*premium, 2)),
            })
            .collect(),
        delivery_options: [
            ("standard", "Standard Delivery", 7, 999),
            ("express", "Express Delivery", 3, 1999),
            ("rush", "Rush Delivery", 1, 3999),
        ]
        .iter()
        .map(|(key, name, days, fee)| DeliveryOption {
            key: (*key).to_string(),
            name: (*name).to_string(),
            days: *days,
            fee: to_f64(Decimal::new(*fee, 2)),
        })
        .collect(),
    }
}
