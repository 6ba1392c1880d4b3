use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::MeshStats;

/// Printer build volume in millimetres (x, y, z)
pub const BUILD_VOLUME_MM: Dimensions = Dimensions {
    x: 230.0,
    y: 130.0,
    z: 160.0,
};

/// Axis-aligned bounding box extents in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Dimensions {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn fits_within(&self, other: &Dimensions) -> bool {
        self.x <= other.x && self.y <= other.y && self.z <= other.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Classification by enclosed volume in cm^3
    pub fn from_volume(volume_cm3: f64) -> Self {
        if volume_cm3 > 50.0 {
            Self::Complex
        } else if volume_cm3 > 20.0 {
            Self::Moderate
        } else {
            Self::Simple
        }
    }
}

/// Where the numbers in a [`ModelAnalysis`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Measured from the uploaded mesh
    Mesh,
    /// Generated without access to the geometry
    Estimated,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub analysis_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub format: String,
    pub vertices: u64,
    pub faces: u64,
    pub edges: u64,
    /// cm^3
    pub volume: f64,
    /// cm^2
    pub surface_area: f64,
    pub dimensions: Dimensions,
    pub complexity: Complexity,
    pub support_needed: bool,
    pub printable: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub source: AnalysisSource,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ModelAnalysis {
    /// Build an analysis from measured mesh statistics
    pub fn from_mesh(
        id: impl Into<String>,
        file_name: impl Into<String>,
        file_size: u64,
        stats: &MeshStats,
        processing_time_ms: u64,
    ) -> Self {
        let file_name = file_name.into();
        let dims = stats.dimensions;
        let complexity = Complexity::from_volume(stats.volume_cm3);
        // Tall, narrow parts tip over without supports
        let support_needed = dims.z > dims.x * 2.0 || dims.z > dims.y * 2.0;

        let mut warnings = Vec::new();
        if !dims.fits_within(&BUILD_VOLUME_MM) {
            warnings.push(format!(
                "Model exceeds the {}x{}x{} mm build volume - scaling required",
                BUILD_VOLUME_MM.x, BUILD_VOLUME_MM.y, BUILD_VOLUME_MM.z
            ));
        }
        if stats.volume_cm3 <= f64::EPSILON {
            warnings.push("Mesh does not enclose a volume - check that it is watertight".into());
        }
        if complexity == Complexity::Complex {
            warnings.push("High complexity model - longer print time expected".into());
        }

        let mut recommendations = Vec::new();
        if complexity != Complexity::Simple {
            recommendations.push("Consider using higher quality settings for better detail".into());
        }
        recommendations.push("Ensure proper bed adhesion for successful print".into());

        Self {
            id: id.into(),
            format: format_of(&file_name),
            file_name,
            file_size,
            vertices: stats.vertices as u64,
            faces: stats.faces as u64,
            edges: stats.edges as u64,
            volume: round_to(stats.volume_cm3, 2),
            surface_area: round_to(stats.surface_area_cm2, 2),
            dimensions: Dimensions::new(
                round_to(dims.x, 1),
                round_to(dims.y, 1),
                round_to(dims.z, 1),
            ),
            complexity,
            support_needed,
            printable: stats.faces > 0 && stats.volume_cm3 > f64::EPSILON,
            warnings,
            recommendations,
            source: AnalysisSource::Mesh,
            processing_time_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Lowercased extension without the dot, `unknown` when there is none
pub fn format_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
